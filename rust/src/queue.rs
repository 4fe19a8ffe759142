//! Heap-backed task priority queue.
//!
//! The queue is a `BinaryHeap` of tasks ordered by urgency (see
//! `crate::sorting`), so the most urgent task is always at the top.
//! Mutations take `&mut self` and reads take `&self`; a drain therefore can
//! never interleave with an insert or pop on the same queue.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;

use crate::config::QueueConfig;
use crate::models::{DueDate, Task, TaskId, Tier};
use crate::sorting::{compare_urgency, sort_by_urgency, StatusFilter};
use crate::{log_changes, log_debug};

/// Errors that can occur during queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Task queue is empty")]
    EmptyContainer,
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("No task ids left to assign")]
    IdsExhausted,
}

/// Upper bound on up-front reservation; larger capacity hints are clamped.
pub const MAX_PREALLOCATED_TASKS: usize = 1 << 16;

/// Heap slot. Equality and order come from urgency alone.
#[derive(Clone, Debug)]
struct Entry(Task);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_urgency(&self.0, &other.0)
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue that always yields the most urgent task next.
#[derive(Clone, Debug)]
pub struct TaskQueue {
    heap: BinaryHeap<Entry>,
    /// Resident task count per id (more than 1 only if a caller reused an id).
    resident: FxHashMap<TaskId, usize>,
    /// Next auto-assigned id; always above every id seen so far.
    /// `None` once an id of `TaskId::MAX` has been inserted.
    next_id: Option<TaskId>,
    config: QueueConfig,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// `config.initial_capacity` is a hint, clamped to `MAX_PREALLOCATED_TASKS`.
    pub fn with_config(config: QueueConfig) -> Self {
        let capacity = config.initial_capacity.min(MAX_PREALLOCATED_TASKS);
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            resident: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_id: Some(config.first_id),
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Add a task. Always succeeds.
    pub fn insert(&mut self, task: Task) {
        log_changes!(
            self.config.verbosity,
            "Insert task {} (priority={}, due={:?}, size={})",
            task.id,
            task.tier,
            task.due_date.map(DueDate::as_millis),
            self.heap.len() + 1
        );
        *self.resident.entry(task.id).or_insert(0) += 1;
        if let Some(next) = self.next_id {
            if task.id >= next {
                self.next_id = task.id.checked_add(1);
            }
        }
        self.heap.push(Entry(task));
    }

    /// Add a new task under an auto-assigned id and return that id.
    ///
    /// Auto-assigned ids are strictly increasing and never reuse an id
    /// that has been inserted into this queue. Fails with `IdsExhausted`
    /// once `TaskId::MAX` has been used; the queue is left unchanged.
    pub fn insert_new(
        &mut self,
        description: impl Into<String>,
        tier: Tier,
        due_date: Option<DueDate>,
    ) -> Result<TaskId, QueueError> {
        let id = self.next_id.ok_or(QueueError::IdsExhausted)?;
        self.insert(Task::new(id, description, tier).with_due_date(due_date));
        Ok(id)
    }

    /// The most urgent task, left in place.
    pub fn peek_top(&self) -> Result<&Task, QueueError> {
        self.heap
            .peek()
            .map(|entry| &entry.0)
            .ok_or(QueueError::EmptyContainer)
    }

    /// Remove and return the most urgent task.
    pub fn pop_top(&mut self) -> Result<Task, QueueError> {
        let Entry(task) = self.heap.pop().ok_or(QueueError::EmptyContainer)?;
        self.forget(task.id);
        log_changes!(
            self.config.verbosity,
            "Pop task {} (priority={}, remaining={})",
            task.id,
            task.tier,
            self.heap.len()
        );
        Ok(task)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.resident.contains_key(&id)
    }

    /// Every resident task, most urgent first. The queue is left untouched.
    pub fn drain_sorted(&self) -> Vec<Task> {
        self.drain_filtered(StatusFilter::All)
    }

    /// Resident tasks matching `filter`, most urgent first.
    pub fn drain_filtered(&self, filter: StatusFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .heap
            .iter()
            .map(|entry| &entry.0)
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        sort_by_urgency(&mut tasks);
        log_debug!(
            self.config.verbosity,
            "Drain filter={} matched {}/{} tasks",
            filter.as_str(),
            tasks.len(),
            self.heap.len()
        );
        tasks
    }

    /// Remove the task with the given id.
    ///
    /// Linear in the queue size: the heap is rebuilt without the task.
    /// If the id was reused by the caller, the most urgent match is removed.
    pub fn remove(&mut self, id: TaskId) -> Result<Task, QueueError> {
        if !self.contains(id) {
            return Err(QueueError::TaskNotFound(id));
        }

        let mut entries = std::mem::take(&mut self.heap).into_vec();
        let position = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.0.id == id)
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(i, _)| i);

        let Some(position) = position else {
            self.heap = BinaryHeap::from(entries);
            return Err(QueueError::TaskNotFound(id));
        };

        let Entry(task) = entries.swap_remove(position);
        self.heap = BinaryHeap::from(entries);
        self.forget(task.id);
        log_changes!(
            self.config.verbosity,
            "Remove task {} (remaining={})",
            task.id,
            self.heap.len()
        );
        Ok(task)
    }

    /// Remove every completed task and return them, most urgent first.
    pub fn clear_completed(&mut self) -> Vec<Task> {
        let (done, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(|entry| entry.0.completed);
        self.heap = BinaryHeap::from(kept);

        let mut removed: Vec<Task> = done.into_iter().map(|Entry(task)| task).collect();
        for task in &removed {
            self.forget(task.id);
        }
        sort_by_urgency(&mut removed);

        log_changes!(
            self.config.verbosity,
            "Cleared {} completed tasks (remaining={})",
            removed.len(),
            self.heap.len()
        );
        removed
    }

    /// Drop every resident task. Auto-assigned ids keep increasing.
    pub fn clear(&mut self) {
        log_changes!(self.config.verbosity, "Clear {} tasks", self.heap.len());
        self.heap.clear();
        self.resident.clear();
    }

    fn forget(&mut self, id: TaskId) {
        if let Some(count) = self.resident.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.resident.remove(&id);
            }
        }
    }
}

impl Extend<Task> for TaskQueue {
    fn extend<I: IntoIterator<Item = Task>>(&mut self, iter: I) {
        for task in iter {
            self.insert(task);
        }
    }
}

impl FromIterator<Task> for TaskQueue {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorting::sort_tasks;

    fn make_task(id: TaskId, tier: Tier, due_ms: i64) -> Task {
        Task::new(id, format!("task-{id}"), tier)
            .with_due_date(DueDate::from_millis(due_ms).unwrap())
    }

    fn scenario_queue() -> TaskQueue {
        let mut queue = TaskQueue::new();
        queue.insert(make_task(1, Tier::Medium, 0));
        queue.insert(make_task(2, Tier::High, 0));
        queue.insert(make_task(3, Tier::Medium, 5000));
        queue.insert(make_task(4, Tier::Medium, 2000));
        queue
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.count(), 0);
        assert!(queue.is_empty());
        assert_eq!(queue.peek_top(), Err(QueueError::EmptyContainer));
        assert_eq!(queue.pop_top(), Err(QueueError::EmptyContainer));
        assert!(queue.drain_sorted().is_empty());
        // Still usable after the error
        queue.insert(make_task(1, Tier::Low, 0));
        assert_eq!(queue.count(), 1);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut queue = scenario_queue();
        assert_eq!(ids(&queue.drain_sorted()), vec![2, 4, 3, 1]);

        let top = queue.pop_top().unwrap();
        assert_eq!(top.id, 2);
        assert_eq!(queue.count(), 3);
        assert_eq!(ids(&queue.drain_sorted()), vec![4, 3, 1]);
    }

    #[test]
    fn test_pop_returns_what_peek_saw() {
        let mut queue = scenario_queue();
        let before = queue.count();
        let peeked = queue.peek_top().unwrap().clone();
        let popped = queue.pop_top().unwrap();
        assert_eq!(peeked, popped);
        assert_eq!(queue.count(), before - 1);
        assert!(!queue.contains(popped.id));
    }

    #[test]
    fn test_pops_come_out_in_drain_order() {
        let mut queue: TaskQueue = (0..30)
            .map(|i| make_task(i, Tier::ALL[(i * 7 % 3) as usize], (i * 37 % 5) * 1000))
            .collect();
        let expected = ids(&queue.drain_sorted());

        let mut popped = Vec::new();
        while let Ok(task) = queue.pop_top() {
            popped.push(task.id);
        }
        assert_eq!(popped, expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_does_not_change_state() {
        let queue = scenario_queue();
        let first = queue.drain_sorted();
        assert_eq!(queue.count(), 4);
        let second = queue.drain_sorted();
        assert_eq!(queue.count(), 4);
        assert_eq!(first, second);
        assert_eq!(queue.peek_top().map(|t| t.id), Ok(2));
    }

    #[test]
    fn test_completed_does_not_affect_order() {
        let mut queue = TaskQueue::new();
        queue.insert(make_task(1, Tier::High, 0).with_completed(true));
        queue.insert(make_task(2, Tier::Low, 0));
        assert_eq!(queue.peek_top().map(|t| t.id), Ok(1));
    }

    #[test]
    fn test_insert_new_assigns_increasing_ids() {
        let mut queue = TaskQueue::new();
        let a = queue.insert_new("a", Tier::Low, None).unwrap();
        let b = queue.insert_new("b", Tier::Low, None).unwrap();
        assert_eq!(a, 1);
        assert!(b > a);

        // External ids push the counter past themselves
        queue.insert(make_task(40, Tier::Low, 0));
        let c = queue.insert_new("c", Tier::Low, None).unwrap();
        assert_eq!(c, 41);

        // Lower external ids do not move it back
        queue.insert(make_task(5, Tier::Low, 0));
        let d = queue.insert_new("d", Tier::Low, None).unwrap();
        assert_eq!(d, 42);
    }

    #[test]
    fn test_ids_keep_increasing_after_removal() {
        let mut queue = TaskQueue::with_config(QueueConfig {
            first_id: 100,
            ..QueueConfig::default()
        });
        let a = queue.insert_new("a", Tier::High, None).unwrap();
        assert_eq!(a, 100);
        queue.pop_top().unwrap();
        queue.clear();
        let b = queue.insert_new("b", Tier::High, None).unwrap();
        assert_eq!(b, 101);
    }

    #[test]
    fn test_insert_new_after_max_id() {
        let mut queue = TaskQueue::new();
        queue.insert(make_task(TaskId::MAX, Tier::Low, 0));
        assert_eq!(
            queue.insert_new("late", Tier::High, None),
            Err(QueueError::IdsExhausted)
        );
        assert_eq!(queue.count(), 1);
        assert_eq!(queue.peek_top().map(|t| t.id), Ok(TaskId::MAX));

        // Caller-assigned ids are still accepted
        queue.insert(make_task(3, Tier::High, 0));
        assert_eq!(queue.count(), 2);
        assert_eq!(
            queue.insert_new("later", Tier::Low, None),
            Err(QueueError::IdsExhausted)
        );
    }

    #[test]
    fn test_last_id_before_max_is_handed_out() {
        let mut queue = TaskQueue::with_config(QueueConfig {
            first_id: TaskId::MAX - 1,
            ..QueueConfig::default()
        });
        assert_eq!(queue.insert_new("a", Tier::Low, None), Ok(TaskId::MAX - 1));
        assert_eq!(queue.insert_new("b", Tier::Low, None), Ok(TaskId::MAX));
        assert_eq!(
            queue.insert_new("c", Tier::Low, None),
            Err(QueueError::IdsExhausted)
        );
        assert_eq!(queue.count(), 2);
    }

    #[test]
    fn test_oversized_capacity_hint_is_clamped() {
        let mut queue = TaskQueue::with_config(QueueConfig {
            initial_capacity: usize::MAX / 2,
            ..QueueConfig::default()
        });
        assert!(queue.is_empty());
        queue.insert(make_task(1, Tier::Medium, 0));
        assert_eq!(queue.count(), 1);
        assert_eq!(queue.config().initial_capacity, usize::MAX / 2);
    }

    #[test]
    fn test_remove_by_id() {
        let mut queue = scenario_queue();
        let removed = queue.remove(4).unwrap();
        assert_eq!(removed.id, 4);
        assert_eq!(queue.count(), 3);
        assert!(!queue.contains(4));
        assert_eq!(ids(&queue.drain_sorted()), vec![2, 3, 1]);

        assert_eq!(queue.pop_top().map(|t| t.id), Ok(2));
        assert_eq!(queue.pop_top().map(|t| t.id), Ok(3));
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut queue = scenario_queue();
        assert_eq!(queue.remove(99), Err(QueueError::TaskNotFound(99)));
        assert_eq!(queue.count(), 4);
        assert_eq!(ids(&queue.drain_sorted()), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_clear_completed() {
        let mut queue = TaskQueue::new();
        queue.insert(make_task(1, Tier::Low, 0).with_completed(true));
        queue.insert(make_task(2, Tier::High, 0));
        queue.insert(make_task(3, Tier::High, 0).with_completed(true));
        queue.insert(make_task(4, Tier::Medium, 0));

        let removed = queue.clear_completed();
        assert_eq!(ids(&removed), vec![3, 1]);
        assert_eq!(queue.count(), 2);
        assert!(!queue.contains(1));
        assert!(queue.contains(2));
        assert_eq!(ids(&queue.drain_sorted()), vec![2, 4]);

        assert!(queue.clear_completed().is_empty());
    }

    #[test]
    fn test_drain_filtered() {
        let mut queue = TaskQueue::new();
        queue.insert(make_task(1, Tier::Medium, 0).with_completed(true));
        queue.insert(make_task(2, Tier::Medium, 3000));
        queue.insert(make_task(3, Tier::Low, 0));

        assert_eq!(ids(&queue.drain_filtered(StatusFilter::Active)), vec![2, 3]);
        assert_eq!(ids(&queue.drain_filtered(StatusFilter::Completed)), vec![1]);
        assert_eq!(queue.count(), 3);
    }

    #[test]
    fn test_duplicate_ids_are_counted() {
        let mut queue = TaskQueue::new();
        queue.insert(make_task(7, Tier::Low, 0));
        queue.insert(make_task(7, Tier::High, 0));
        assert_eq!(queue.count(), 2);

        let removed = queue.remove(7).unwrap();
        assert_eq!(removed.tier, Tier::High);
        assert!(queue.contains(7));
        queue.remove(7).unwrap();
        assert!(!queue.contains(7));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_batch_sort_matches_queue_drain() {
        let tasks: Vec<Task> = (0..20)
            .map(|i| make_task(i, Tier::ALL[(i % 3) as usize], (i % 4) * 250))
            .collect();
        let queue: TaskQueue = tasks.iter().cloned().collect();
        assert_eq!(queue.drain_sorted(), sort_tasks(tasks, StatusFilter::All));
    }

    #[test]
    fn test_clear() {
        let mut queue = scenario_queue();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains(1));
        assert_eq!(queue.pop_top(), Err(QueueError::EmptyContainer));
    }
}
