//! Urgency ordering for tasks.
//!
//! Tasks are ranked by:
//! 1. Tier: `high` > `medium` > `low`
//! 2. Within a tier, a set due date beats no due date, and earlier beats later
//! 3. Lower id beats higher id (final tie-break)
//!
//! `UrgencyKey` orders so that *greater = more urgent*, which is what
//! `BinaryHeap` (a max-heap) wants at its top.

use std::cmp::{Ordering, Reverse};
use std::str::FromStr;

use crate::models::{DueDate, ModelError, Task, TaskId, Tier};

/// Comparable projection of a task's ordering fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UrgencyKey {
    pub tier: Tier,
    pub due_date: Option<DueDate>,
    pub id: TaskId,
}

impl UrgencyKey {
    pub fn of(task: &Task) -> Self {
        Self {
            tier: task.tier,
            due_date: task.due_date,
            id: task.id,
        }
    }
}

/// Dated before undated, then earlier before later.
fn cmp_due_dates(a: Option<DueDate>, b: Option<DueDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

impl Ord for UrgencyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| cmp_due_dates(self.due_date, other.due_date))
            .then_with(|| Reverse(self.id).cmp(&Reverse(other.id)))
    }
}

impl PartialOrd for UrgencyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two tasks by urgency. `Greater` means `a` should come out first.
pub fn compare_urgency(a: &Task, b: &Task) -> Ordering {
    UrgencyKey::of(a).cmp(&UrgencyKey::of(b))
}

/// Whether `a` should be served strictly before `b`.
pub fn is_more_urgent(a: &Task, b: &Task) -> bool {
    compare_urgency(a, b) == Ordering::Greater
}

/// Completion-status filter applied to sorted output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            _ => Err(ModelError::InvalidFilter(s.to_string())),
        }
    }
}

/// Sort tasks in place, most urgent first.
pub fn sort_by_urgency(tasks: &mut [Task]) {
    // Keys are total for distinct ids, so an unstable sort is deterministic.
    tasks.sort_unstable_by(|a, b| compare_urgency(b, a));
}

/// Sort a batch of tasks without building a queue.
///
/// Returns the tasks matching `filter`, most urgent first.
pub fn sort_tasks(tasks: Vec<Task>, filter: StatusFilter) -> Vec<Task> {
    let mut kept: Vec<Task> = tasks.into_iter().filter(|t| filter.matches(t)).collect();
    sort_by_urgency(&mut kept);
    kept
}
