use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};
use thiserror::Error;

use crate::datetime::api_datetime;

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub enum TaskStatus {
  #[serde(rename = "Pending")]
  Pending,
  #[serde(rename = "In progress")]
  InProgress,
  #[serde(rename = "Completed")]
  Completed
}

impl TaskStatus {
  pub const ALL: [TaskStatus; 3] = [
    TaskStatus::Pending,
    TaskStatus::InProgress,
    TaskStatus::Completed
  ];

  /// Wire and display label, exactly
  /// as the backend spells it.
  pub fn label(self) -> &'static str {
    match self {
      | TaskStatus::Pending => "Pending",
      | TaskStatus::InProgress => {
        "In progress"
      }
      | TaskStatus::Completed => {
        "Completed"
      }
    }
  }

  /// A task can only be started while
  /// it is still pending.
  pub fn can_start(self) -> bool {
    self == TaskStatus::Pending
  }

  pub fn can_complete(self) -> bool {
    self == TaskStatus::InProgress
  }

  /// Completed has no forward
  /// transition for tasks.
  pub fn is_terminal(self) -> bool {
    self == TaskStatus::Completed
  }

  /// Subtasks cycle through all three
  /// states, one step per toggle.
  pub fn next_subtask_status(
    self
  ) -> TaskStatus {
    match self {
      | TaskStatus::Pending => {
        TaskStatus::InProgress
      }
      | TaskStatus::InProgress => {
        TaskStatus::Completed
      }
      | TaskStatus::Completed => {
        TaskStatus::Pending
      }
    }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
  "unknown status '{0}' (expected pending, in-progress or completed)"
)]
pub struct StatusParseError(pub String);

impl FromStr for TaskStatus {
  type Err = StatusParseError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "pending" => Ok(TaskStatus::Pending),
      | "in progress"
      | "in-progress"
      | "in_progress"
      | "inprogress"
      | "started" => {
        Ok(TaskStatus::InProgress)
      }
      | "completed" | "done" => {
        Ok(TaskStatus::Completed)
      }
      | _ => {
        Err(StatusParseError(
          s.to_string()
        ))
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Subtask {
  pub id:           u64,
  #[serde(default)]
  pub task_id:      Option<u64>,
  pub title:        String,
  #[serde(default)]
  pub description:  Option<String>,
  pub status:       TaskStatus,
  #[serde(with = "api_datetime")]
  pub created_at:   DateTime<Utc>,
  #[serde(
    default,
    with = "api_datetime::option"
  )]
  pub started_at:   Option<DateTime<Utc>>,
  #[serde(
    default,
    with = "api_datetime::option"
  )]
  pub completed_at: Option<DateTime<Utc>>,
  #[serde(
    default,
    with = "api_datetime::option"
  )]
  pub updated_at:   Option<DateTime<Utc>>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Task {
  pub id:           u64,
  pub name:         String,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(with = "api_datetime")]
  pub created_at:   DateTime<Utc>,
  #[serde(
    default,
    with = "api_datetime::option"
  )]
  pub started_at:   Option<DateTime<Utc>>,
  #[serde(
    default,
    with = "api_datetime::option"
  )]
  pub completed_at: Option<DateTime<Utc>>,
  pub status:       TaskStatus,
  #[serde(default)]
  pub subtasks:     Vec<Subtask>,
  #[serde(default)]
  pub page_name:    String
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleViolation {
  #[error("task {id} is Pending but has a start time")]
  StartedWhilePending { id: u64 },
  #[error("task {id} is {status} but has a completion time")]
  CompletedWhileOpen {
    id:     u64,
    status: TaskStatus
  },
  #[error("task {id} timestamps are out of order")]
  OutOfOrder { id: u64 }
}

impl Task {
  /// Backend-side invariants. Callers
  /// only log violations.
  pub fn check_lifecycle(
    &self
  ) -> Result<(), LifecycleViolation> {
    if self.status == TaskStatus::Pending
      && self.started_at.is_some()
    {
      return Err(
        LifecycleViolation::StartedWhilePending {
          id: self.id
        }
      );
    }

    if self.status != TaskStatus::Completed
      && self.completed_at.is_some()
    {
      return Err(
        LifecycleViolation::CompletedWhileOpen {
          id:     self.id,
          status: self.status
        }
      );
    }

    let started_ok = self
      .started_at
      .map(|s| s >= self.created_at)
      .unwrap_or(true);
    let completed_ok =
      match (self.started_at, self.completed_at) {
        | (Some(s), Some(c)) => c >= s,
        | (None, Some(c)) => c >= self.created_at,
        | _ => true
      };
    if !started_ok || !completed_ok {
      return Err(
        LifecycleViolation::OutOfOrder {
          id: self.id
        }
      );
    }

    Ok(())
  }

  pub fn completed_subtasks(
    &self
  ) -> usize {
    self
      .subtasks
      .iter()
      .filter(|s| {
        s.status == TaskStatus::Completed
      })
      .count()
  }

  pub fn subtask(
    &self,
    subtask_id: u64
  ) -> Option<&Subtask> {
    self
      .subtasks
      .iter()
      .find(|s| s.id == subtask_id)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct SubtaskCreate {
  pub title:       String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct TaskCreate {
  pub name:        String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>,
  #[serde(default)]
  pub subtasks:    Vec<SubtaskCreate>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct SubtaskStatusUpdate {
  pub status: TaskStatus
}

#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct OverallCounts {
  pub total:       u64,
  pub pending:     u64,
  pub in_progress: u64,
  pub completed:   u64
}

#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct SubtaskCoverage {
  pub with_subtasks:    u64,
  pub without_subtasks: u64
}

/// Server-side counts from the
/// analytics route.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct AnalyticsSummary {
  pub overall:     OverallCounts,
  pub by_subtasks: SubtaskCoverage
}
