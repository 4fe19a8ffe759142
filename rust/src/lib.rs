//! Rust implementation of the todo priority queue.
//!
//! The core (`models`, `sorting`, `queue`) is plain Rust with no host
//! concerns. This file is the Python binding: it converts host values into
//! tasks and maps queue errors onto Python exceptions.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::{PyIndexError, PyKeyError, PyOverflowError, PyValueError};
use pyo3::prelude::*;

mod config;
pub mod logging;
mod models;
pub mod queue;
pub mod sorting;

pub use config::QueueConfig;
pub use models::{DueDate, ModelError, Task, TaskId, Tier};
pub use queue::{QueueError, TaskQueue};
pub use sorting::{compare_urgency, is_more_urgent, sort_tasks, StatusFilter, UrgencyKey};

impl From<ModelError> for PyErr {
    fn from(err: ModelError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

impl From<QueueError> for PyErr {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::EmptyContainer => PyIndexError::new_err(err.to_string()),
            QueueError::TaskNotFound(id) => PyKeyError::new_err(id),
            QueueError::IdsExhausted => PyOverflowError::new_err(err.to_string()),
        }
    }
}

/// Priority queue of tasks (PyO3 wrapper).
///
/// PyO3's borrow checking gives each call exclusive access for mutations,
/// so a drain can never overlap a push or pop on the same object.
#[pyclass(name = "TaskQueue")]
pub struct PyTaskQueue {
    inner: TaskQueue,
}

#[pymethods]
impl PyTaskQueue {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<QueueConfig>) -> Self {
        Self {
            inner: TaskQueue::with_config(config.unwrap_or_default()),
        }
    }

    /// Insert an existing task, keeping its id.
    fn push(&mut self, task: Task) {
        self.inner.insert(task);
    }

    /// Create and insert a task under an auto-assigned id.
    ///
    /// # Arguments
    /// * `text` - Task description
    /// * `priority` - "high", "medium" or "low"
    /// * `due_date` - Epoch milliseconds, 0 for no due date
    ///
    /// # Returns
    /// * The assigned task id
    ///
    /// # Raises
    /// * ValueError for an unknown priority or a negative due date
    /// * OverflowError once no larger id is left to assign
    #[pyo3(signature = (text, priority="medium", due_date=0))]
    fn add(&mut self, text: String, priority: &str, due_date: i64) -> PyResult<TaskId> {
        let tier = priority.parse::<Tier>()?;
        let due_date = DueDate::from_millis(due_date)?;
        Ok(self.inner.insert_new(text, tier, due_date)?)
    }

    /// Most urgent task without removing it. Raises IndexError when empty.
    fn peek(&self) -> PyResult<Task> {
        Ok(self.inner.peek_top()?.clone())
    }

    /// Remove and return the most urgent task. Raises IndexError when empty.
    fn pop(&mut self) -> PyResult<Task> {
        Ok(self.inner.pop_top()?)
    }

    fn count(&self) -> usize {
        self.inner.count()
    }

    fn empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn __len__(&self) -> usize {
        self.inner.count()
    }

    fn __contains__(&self, id: TaskId) -> bool {
        self.inner.contains(id)
    }

    /// All tasks, most urgent first, optionally filtered by completion
    /// status ("all", "active" or "completed"). The queue is unchanged.
    #[pyo3(signature = (filter="all"))]
    fn get_all_sorted(&self, filter: &str) -> PyResult<Vec<Task>> {
        let filter = filter.parse::<StatusFilter>()?;
        Ok(self.inner.drain_filtered(filter))
    }

    /// Remove a task by id. Raises KeyError if it is not in the queue.
    fn remove(&mut self, id: TaskId) -> PyResult<Task> {
        Ok(self.inner.remove(id)?)
    }

    fn clear_completed(&mut self) -> Vec<Task> {
        self.inner.clear_completed()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn __repr__(&self) -> String {
        let top = match self.inner.peek_top() {
            Ok(task) => task.id.to_string(),
            Err(_) => "None".to_string(),
        };
        format!("TaskQueue(count={}, top={})", self.inner.count(), top)
    }
}

/// Sort tasks by urgency without keeping a queue around.
///
/// # Arguments
/// * `tasks` - Tasks to sort
/// * `filter` - "all", "active" or "completed"
///
/// # Returns
/// * Matching tasks, most urgent first
///
/// # Raises
/// * ValueError for an unknown filter
#[pyfunction]
#[pyo3(signature = (tasks, filter="all"))]
fn sort_todos(tasks: Vec<Task>, filter: &str) -> PyResult<Vec<Task>> {
    let filter = filter.parse::<StatusFilter>()?;
    Ok(sort_tasks(tasks, filter))
}

/// The todo_queue.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Task>()?;
    m.add_class::<PyTaskQueue>()?;

    // Config types
    m.add_class::<QueueConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(sort_todos, m)?)?;

    Ok(())
}
