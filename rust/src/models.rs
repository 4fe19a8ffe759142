//! Core data types for the task queue.

use chrono::{DateTime, Utc};
use pyo3::prelude::*;
use rustc_hash::FxHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Task identity. Only used as the final ordering tie-break.
pub type TaskId = i64;

/// Errors raised while building tasks from loosely typed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid priority tier: {0:?} (expected \"high\", \"medium\" or \"low\")")]
    InvalidTier(String),
    #[error("Invalid due date: {0}ms (must be non-negative, 0 means unset)")]
    InvalidDueDate(i64),
    #[error("Invalid status filter: {0:?} (expected \"all\", \"active\" or \"completed\")")]
    InvalidFilter(String),
}

/// Caller-assigned urgency class. Declaration order is the ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Low,
    #[default]
    Medium,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ModelError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::InvalidTier(s.to_string()))
    }
}

/// A set deadline, in milliseconds since the Unix epoch.
///
/// Always strictly positive: the host-side sentinel `0` maps to `None`
/// before a `DueDate` is ever built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(i64);

impl DueDate {
    /// Host-side value meaning "no due date".
    pub const UNSET_MILLIS: i64 = 0;

    pub fn from_millis(millis: i64) -> Result<Option<Self>, ModelError> {
        match millis {
            Self::UNSET_MILLIS => Ok(None),
            m if m < 0 => Err(ModelError::InvalidDueDate(m)),
            m => Ok(Some(Self(m))),
        }
    }

    /// A datetime exactly at the Unix epoch is indistinguishable from the
    /// host-side sentinel and comes back as `None` (no due date).
    pub fn from_datetime(datetime: DateTime<Utc>) -> Result<Option<Self>, ModelError> {
        Self::from_millis(datetime.timestamp_millis())
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// `None` only for timestamps beyond chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// A unit of work held by the queue.
///
/// Immutable from the host side: changing a task means removing it and
/// inserting a new one.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    #[pyo3(get)]
    pub id: TaskId,
    #[pyo3(get, name = "text")]
    pub description: String,
    #[pyo3(get)]
    pub completed: bool,
    pub tier: Tier,
    pub due_date: Option<DueDate>,
}

impl Task {
    /// Tier-only task: no due date, not completed.
    pub fn new(id: TaskId, description: impl Into<String>, tier: Tier) -> Self {
        Self {
            id,
            description: description.into(),
            completed: false,
            tier,
            due_date: None,
        }
    }

    pub fn with_due_date(mut self, due_date: Option<DueDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Build a task from the loosely typed shape used at the host boundary.
    pub fn from_parts(
        id: TaskId,
        text: impl Into<String>,
        completed: bool,
        priority: &str,
        due_date_ms: i64,
    ) -> Result<Self, ModelError> {
        let tier = priority.parse::<Tier>()?;
        let due_date = DueDate::from_millis(due_date_ms)?;
        Ok(Self::new(id, text, tier)
            .with_due_date(due_date)
            .with_completed(completed))
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (id, text, priority="medium", completed=false, due_date=0))]
    fn py_new(
        id: TaskId,
        text: String,
        priority: &str,
        completed: bool,
        due_date: i64,
    ) -> PyResult<Self> {
        Ok(Self::from_parts(id, text, completed, priority, due_date)?)
    }

    #[getter]
    fn priority(&self) -> &'static str {
        self.tier.as_str()
    }

    /// Due date in epoch milliseconds, `0` when unset.
    #[getter(due_date)]
    fn due_date_millis(&self) -> i64 {
        self.due_date.map_or(DueDate::UNSET_MILLIS, DueDate::as_millis)
    }

    #[getter]
    fn due_datetime(&self) -> Option<DateTime<Utc>> {
        self.due_date.and_then(DueDate::to_datetime)
    }

    fn __eq__(&self, other: &Self) -> bool {
        self == other
    }

    /// Hashes every field, matching `__eq__`.
    fn __hash__(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn __repr__(&self) -> String {
        let due = match self.due_date {
            Some(d) => d.to_string(),
            None => "None".to_string(),
        };
        format!(
            "Task(id={}, text={:?}, priority={}, completed={}, due_date={})",
            self.id,
            self.description,
            self.tier,
            if self.completed { "True" } else { "False" },
            due
        )
    }
}
