use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;

use crate::datetime::{
  format_day,
  status_duration
};
use crate::task::{
  Subtask,
  Task,
  TaskStatus
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum BadgeTone {
  Warning,
  Default,
  Success
}

impl BadgeTone {
  pub fn for_status(
    status: TaskStatus
  ) -> Self {
    match status {
      | TaskStatus::Pending => {
        BadgeTone::Warning
      }
      | TaskStatus::InProgress => {
        BadgeTone::Default
      }
      | TaskStatus::Completed => {
        BadgeTone::Success
      }
    }
  }

  pub fn class_name(self) -> &'static str {
    match self {
      | BadgeTone::Warning => {
        "badge badge-warning"
      }
      | BadgeTone::Default => {
        "badge badge-default"
      }
      | BadgeTone::Success => {
        "badge badge-success"
      }
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum StatusIcon {
  Circle,
  Clock,
  Play,
  CheckCircle
}

impl StatusIcon {
  pub fn for_task(
    status: TaskStatus
  ) -> Self {
    match status {
      | TaskStatus::Pending => {
        StatusIcon::Clock
      }
      | TaskStatus::InProgress => {
        StatusIcon::Play
      }
      | TaskStatus::Completed => {
        StatusIcon::CheckCircle
      }
    }
  }

  pub fn for_subtask(
    status: TaskStatus
  ) -> Self {
    match status {
      | TaskStatus::Pending => {
        StatusIcon::Circle
      }
      | TaskStatus::InProgress => {
        StatusIcon::Clock
      }
      | TaskStatus::Completed => {
        StatusIcon::CheckCircle
      }
    }
  }

  /// Terminal stand-in for the icon.
  pub fn glyph(self) -> &'static str {
    match self {
      | StatusIcon::Circle => "○",
      | StatusIcon::Clock => "◷",
      | StatusIcon::Play => "▶",
      | StatusIcon::CheckCircle => "✔"
    }
  }

  pub fn class_name(self) -> &'static str {
    match self {
      | StatusIcon::Circle => "icon-circle",
      | StatusIcon::Clock => "icon-clock",
      | StatusIcon::Play => "icon-play",
      | StatusIcon::CheckCircle => {
        "icon-check-circle"
      }
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum SubtaskTone {
  Muted,
  Primary,
  Accent
}

impl SubtaskTone {
  pub fn for_status(
    status: TaskStatus
  ) -> Self {
    match status {
      | TaskStatus::Pending => {
        SubtaskTone::Muted
      }
      | TaskStatus::InProgress => {
        SubtaskTone::Primary
      }
      | TaskStatus::Completed => {
        SubtaskTone::Accent
      }
    }
  }

  pub fn class_name(self) -> &'static str {
    match self {
      | SubtaskTone::Muted => "text-muted",
      | SubtaskTone::Primary => {
        "text-primary"
      }
      | SubtaskTone::Accent => "text-accent"
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ItemAction {
  Start,
  Complete,
  Delete
}

impl ItemAction {
  pub fn label(self) -> &'static str {
    match self {
      | ItemAction::Start => "Start",
      | ItemAction::Complete => "Complete",
      | ItemAction::Delete => "Delete"
    }
  }
}

/// Buttons offered for a task in the
/// given state. Delete is always there.
pub fn task_actions(
  status: TaskStatus
) -> Vec<ItemAction> {
  let mut actions = Vec::with_capacity(2);
  if status.can_start() {
    actions.push(ItemAction::Start);
  }
  if status.can_complete() {
    actions.push(ItemAction::Complete);
  }
  actions.push(ItemAction::Delete);
  actions
}

fn subtask_count_label(
  count: usize
) -> String {
  if count == 1 {
    "1 subtask".to_string()
  } else {
    format!("{count} subtasks")
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskView {
  pub id:          u64,
  pub title:       String,
  pub description: Option<String>,
  pub status:      TaskStatus,
  pub icon:        StatusIcon,
  pub tone:        SubtaskTone,
  pub next_status: TaskStatus,
  pub duration:    String
}

impl SubtaskView {
  pub fn derive(
    subtask: &Subtask,
    now: DateTime<Utc>
  ) -> Self {
    Self {
      id:          subtask.id,
      title:       subtask.title.clone(),
      description: subtask
        .description
        .clone()
        .filter(|d| !d.trim().is_empty()),
      status:      subtask.status,
      icon:        StatusIcon::for_subtask(
        subtask.status
      ),
      tone:        SubtaskTone::for_status(
        subtask.status
      ),
      next_status: subtask
        .status
        .next_subtask_status(),
      duration:    status_duration(
        subtask.status,
        subtask.started_at,
        subtask.completed_at,
        now
      )
    }
  }
}

/// Everything a list item needs to
/// draw one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
  pub id:          u64,
  pub name:        String,
  pub description: Option<String>,
  pub status:      TaskStatus,
  pub badge:       BadgeTone,
  pub icon:        StatusIcon,
  pub actions:     Vec<ItemAction>,
  pub meta:        Vec<String>,
  pub subtasks:    Vec<SubtaskView>
}

impl TaskView {
  pub fn derive(
    task: &Task,
    tz: &Tz,
    now: DateTime<Utc>
  ) -> Self {
    let mut meta = vec![
      format!(
        "Created: {}",
        format_day(task.created_at, tz)
      ),
      subtask_count_label(
        task.subtasks.len()
      ),
    ];
    let caption = status_duration(
      task.status,
      task.started_at,
      task.completed_at,
      now
    );
    if !caption.is_empty() {
      meta.push(caption);
    }

    Self {
      id: task.id,
      name: task.name.clone(),
      description: task
        .description
        .clone()
        .filter(|d| !d.trim().is_empty()),
      status: task.status,
      badge: BadgeTone::for_status(
        task.status
      ),
      icon: StatusIcon::for_task(
        task.status
      ),
      actions: task_actions(task.status),
      meta,
      subtasks: task
        .subtasks
        .iter()
        .map(|s| SubtaskView::derive(s, now))
        .collect()
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone
  };

  use super::*;

  fn task(status: TaskStatus) -> Task {
    let created = Utc
      .with_ymd_and_hms(2024, 1, 5, 12, 0, 0)
      .single()
      .expect("valid");
    Task {
      id: 1,
      name: "Tune model".to_string(),
      description: Some(" ".to_string()),
      created_at: created,
      started_at: (status != TaskStatus::Pending)
        .then_some(created),
      completed_at: (status
        == TaskStatus::Completed)
        .then(|| created + Duration::days(2)),
      status,
      subtasks: vec![],
      page_name: "Machine Learning".to_string()
    }
  }

  #[test]
  fn actions_follow_status() {
    assert_eq!(
      task_actions(TaskStatus::Pending),
      vec![ItemAction::Start, ItemAction::Delete]
    );
    assert_eq!(
      task_actions(TaskStatus::InProgress),
      vec![
        ItemAction::Complete,
        ItemAction::Delete
      ]
    );
    assert_eq!(
      task_actions(TaskStatus::Completed),
      vec![ItemAction::Delete]
    );
  }

  #[test]
  fn pending_meta_has_no_duration() {
    let now = Utc
      .with_ymd_and_hms(2024, 1, 9, 0, 0, 0)
      .single()
      .expect("valid");
    let view = TaskView::derive(
      &task(TaskStatus::Pending),
      &chrono_tz::UTC,
      now
    );
    assert_eq!(
      view.meta,
      vec![
        "Created: Jan 5, 2024".to_string(),
        "0 subtasks".to_string()
      ]
    );
    assert_eq!(view.badge, BadgeTone::Warning);
    assert_eq!(view.description, None);
  }

  #[test]
  fn completed_meta_reports_elapsed_days() {
    let now = Utc
      .with_ymd_and_hms(2024, 2, 1, 0, 0, 0)
      .single()
      .expect("valid");
    let view = TaskView::derive(
      &task(TaskStatus::Completed),
      &chrono_tz::UTC,
      now
    );
    assert_eq!(
      view.meta.last().map(String::as_str),
      Some("Completed in 2 days")
    );
    assert_eq!(view.icon, StatusIcon::CheckCircle);
  }

  #[test]
  fn subtask_icons_differ_from_task_icons() {
    assert_eq!(
      StatusIcon::for_subtask(TaskStatus::Pending),
      StatusIcon::Circle
    );
    assert_eq!(
      StatusIcon::for_task(TaskStatus::Pending),
      StatusIcon::Clock
    );
    assert_eq!(
      SubtaskTone::for_status(
        TaskStatus::Completed
      ),
      SubtaskTone::Accent
    );
  }
}
