//! Configuration types for the task queue.

use pyo3::prelude::*;

use crate::models::TaskId;

/// Construction-time settings for a `TaskQueue`.
#[pyclass]
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=debug
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Number of tasks to reserve heap space for up front
    #[pyo3(get, set)]
    pub initial_capacity: usize,
    /// First id handed out by auto-assignment
    #[pyo3(get, set)]
    pub first_id: TaskId,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            initial_capacity: 0,
            first_id: 1,
        }
    }
}

#[pymethods]
impl QueueConfig {
    #[new]
    #[pyo3(signature = (verbosity=None, initial_capacity=None, first_id=None))]
    fn new(
        verbosity: Option<u8>,
        initial_capacity: Option<usize>,
        first_id: Option<TaskId>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            initial_capacity: initial_capacity.unwrap_or(defaults.initial_capacity),
            first_id: first_id.unwrap_or(defaults.first_id),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "QueueConfig(verbosity={}, initial_capacity={}, first_id={})",
            self.verbosity, self.initial_capacity, self.first_id
        )
    }
}
