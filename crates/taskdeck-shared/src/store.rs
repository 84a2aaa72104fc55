use std::collections::HashMap;

use crate::task::{
  Subtask,
  Task
};

/// Requests whose responses overwrite
/// each other. Only these are tracked:
/// task mutations refetch and subtask
/// appends or deletes never conflict.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum RequestSlot {
  TaskList,
  AllTasks,
  SubtaskStatus(u64)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct RequestToken {
  pub slot: RequestSlot,
  seq:      u64
}

impl RequestToken {
  pub fn seq(&self) -> u64 {
    self.seq
  }
}

/// Hands out tokens and remembers the
/// newest one per slot until its
/// response arrives.
#[derive(Debug, Clone, Default)]
pub struct RequestLedger {
  next:   u64,
  latest: HashMap<RequestSlot, u64>
}

impl RequestLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn issue(
    &mut self,
    slot: RequestSlot
  ) -> RequestToken {
    self.next += 1;
    self.latest.insert(slot, self.next);
    RequestToken {
      slot,
      seq: self.next
    }
  }

  pub fn is_current(
    &self,
    token: &RequestToken
  ) -> bool {
    self.latest.get(&token.slot)
      == Some(&token.seq)
  }

  /// Slots still waiting on their newest
  /// response.
  pub fn in_flight(&self) -> usize {
    self.latest.len()
  }

  /// True when the response for `token`
  /// may be applied, which settles its
  /// slot. Superseded tokens are logged
  /// and refused.
  pub fn accept(
    &mut self,
    token: &RequestToken
  ) -> bool {
    if self.is_current(token) {
      self.latest.remove(&token.slot);
      return true;
    }
    tracing::debug!(
      slot = ?token.slot,
      seq = token.seq,
      latest = ?self.latest.get(&token.slot),
      "dropping stale response"
    );
    false
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
  /// Clears any shown error.
  ClearError,
  LoadingStarted,
  TasksLoaded(Vec<Task>),
  /// Failed list fetch; the current
  /// list is kept.
  LoadFailed(String),
  SubmitStarted,
  SubmitFinished,
  ProcessStarted,
  ProcessFinished,
  Failed(String),
  SubtaskAdded {
    task_id: u64,
    subtask: Subtask
  },
  SubtaskReplaced(Subtask),
  SubtaskRemoved {
    subtask_id: u64
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStore {
  tasks:      Vec<Task>,
  loading:    bool,
  submitting: u32,
  processing: u32,
  error:      Option<String>
}

impl Default for TaskStore {
  fn default() -> Self {
    Self {
      tasks:      Vec::new(),
      loading:    true,
      submitting: 0,
      processing: 0,
      error:      None
    }
  }
}

impl TaskStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn task(
    &self,
    task_id: u64
  ) -> Option<&Task> {
    self
      .tasks
      .iter()
      .find(|t| t.id == task_id)
  }

  /// Owning task and the subtask, when
  /// any loaded task holds `subtask_id`.
  pub fn find_subtask(
    &self,
    subtask_id: u64
  ) -> Option<(&Task, &Subtask)> {
    self.tasks.iter().find_map(|task| {
      task
        .subtask(subtask_id)
        .map(|sub| (task, sub))
    })
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn is_submitting(&self) -> bool {
    self.submitting > 0
  }

  pub fn is_processing(&self) -> bool {
    self.processing > 0
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn apply(
    &mut self,
    action: TaskAction
  ) {
    match action {
      | TaskAction::ClearError => {
        self.error = None;
      }
      | TaskAction::LoadingStarted => {
        self.loading = true;
        self.error = None;
      }
      | TaskAction::TasksLoaded(tasks) => {
        for task in &tasks {
          if let Err(violation) =
            task.check_lifecycle()
          {
            tracing::warn!(
              %violation,
              "backend returned inconsistent task"
            );
          }
        }
        tracing::debug!(
          count = tasks.len(),
          "tasks loaded"
        );
        self.tasks = tasks;
        self.loading = false;
      }
      | TaskAction::LoadFailed(message) => {
        self.error = Some(message);
        self.loading = false;
      }
      | TaskAction::SubmitStarted => {
        self.submitting += 1;
        self.error = None;
      }
      | TaskAction::SubmitFinished => {
        self.submitting =
          self.submitting.saturating_sub(1);
      }
      | TaskAction::ProcessStarted => {
        self.processing += 1;
        self.error = None;
      }
      | TaskAction::ProcessFinished => {
        self.processing =
          self.processing.saturating_sub(1);
      }
      | TaskAction::Failed(message) => {
        self.error = Some(message);
      }
      | TaskAction::SubtaskAdded {
        task_id,
        mut subtask
      } => {
        subtask.task_id.get_or_insert(task_id);
        match self
          .tasks
          .iter_mut()
          .find(|t| t.id == task_id)
        {
          | Some(task) => {
            task.subtasks.push(subtask)
          }
          | None => {
            tracing::debug!(
              task_id,
              "subtask added to a task that is not loaded"
            );
          }
        }
      }
      | TaskAction::SubtaskReplaced(
        subtask
      ) => {
        let slot = self
          .tasks
          .iter_mut()
          .flat_map(|t| {
            let task_id = t.id;
            t.subtasks
              .iter_mut()
              .map(move |s| (task_id, s))
          })
          .find(|(_, s)| s.id == subtask.id);
        match slot {
          | Some((task_id, existing)) => {
            let mut updated = subtask;
            updated
              .task_id
              .get_or_insert(task_id);
            *existing = updated;
          }
          | None => {
            tracing::debug!(
              subtask_id = subtask.id,
              "updated subtask is not loaded"
            );
          }
        }
      }
      | TaskAction::SubtaskRemoved {
        subtask_id
      } => {
        for task in &mut self.tasks {
          task
            .subtasks
            .retain(|s| s.id != subtask_id);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::*;
  use crate::task::TaskStatus;

  fn subtask(
    id: u64,
    status: TaskStatus
  ) -> Subtask {
    Subtask {
      id,
      task_id: None,
      title: format!("sub {id}"),
      description: None,
      status,
      created_at: Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid"),
      started_at: None,
      completed_at: None,
      updated_at: None
    }
  }

  fn task(
    id: u64,
    subtasks: Vec<Subtask>
  ) -> Task {
    Task {
      id,
      name: format!("task {id}"),
      description: None,
      created_at: Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid"),
      started_at: None,
      completed_at: None,
      status: TaskStatus::Pending,
      subtasks,
      page_name: "Home".to_string()
    }
  }

  #[test]
  fn starts_loading_and_clears_on_load() {
    let mut store = TaskStore::new();
    assert!(store.is_loading());
    store.apply(TaskAction::TasksLoaded(vec![
      task(1, vec![]),
    ]));
    assert!(!store.is_loading());
    assert_eq!(store.tasks().len(), 1);
  }

  #[test]
  fn failed_load_keeps_previous_list() {
    let mut store = TaskStore::new();
    store.apply(TaskAction::TasksLoaded(vec![
      task(1, vec![]),
    ]));
    store.apply(TaskAction::LoadFailed(
      "Failed to fetch tasks".to_string()
    ));
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(
      store.error(),
      Some("Failed to fetch tasks")
    );
    assert!(!store.is_loading());

    store.apply(TaskAction::ProcessStarted);
    assert_eq!(store.error(), None);
    assert!(store.is_processing());
  }

  #[test]
  fn counters_track_overlapping_work() {
    let mut store = TaskStore::new();
    store.apply(TaskAction::ProcessStarted);
    store.apply(TaskAction::ProcessStarted);
    store.apply(TaskAction::ProcessFinished);
    assert!(store.is_processing());
    store.apply(TaskAction::ProcessFinished);
    store.apply(TaskAction::ProcessFinished);
    assert!(!store.is_processing());
  }

  #[test]
  fn subtask_patches_hit_the_owning_task() {
    let mut store = TaskStore::new();
    store.apply(TaskAction::TasksLoaded(vec![
      task(1, vec![subtask(10, TaskStatus::Pending)]),
      task(2, vec![subtask(20, TaskStatus::Pending)]),
    ]));

    store.apply(TaskAction::SubtaskAdded {
      task_id: 2,
      subtask: subtask(21, TaskStatus::Pending)
    });
    assert_eq!(
      store.task(2).map(|t| t.subtasks.len()),
      Some(2)
    );
    assert_eq!(
      store
        .find_subtask(21)
        .and_then(|(_, s)| s.task_id),
      Some(2)
    );

    store.apply(TaskAction::SubtaskReplaced(
      subtask(20, TaskStatus::InProgress)
    ));
    let (owner, updated) =
      store.find_subtask(20).expect("present");
    assert_eq!(owner.id, 2);
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.task_id, Some(2));

    store.apply(TaskAction::SubtaskRemoved {
      subtask_id: 10
    });
    assert!(store.find_subtask(10).is_none());
    assert_eq!(
      store.task(1).map(|t| t.subtasks.len()),
      Some(0)
    );
  }

  #[test]
  fn superseded_fetch_is_not_applied() {
    let mut ledger = RequestLedger::new();
    let mut store = TaskStore::new();

    let older = ledger.issue(RequestSlot::TaskList);
    let newer = ledger.issue(RequestSlot::TaskList);

    if ledger.accept(&newer) {
      store.apply(TaskAction::TasksLoaded(vec![
        task(2, vec![]),
      ]));
    }
    if ledger.accept(&older) {
      store.apply(TaskAction::TasksLoaded(vec![
        task(1, vec![]),
      ]));
    }

    assert_eq!(
      store.tasks().iter().map(|t| t.id).collect::<Vec<_>>(),
      vec![2]
    );
  }

  #[test]
  fn slots_are_independent() {
    let mut ledger = RequestLedger::new();
    let a =
      ledger.issue(RequestSlot::SubtaskStatus(1));
    let b =
      ledger.issue(RequestSlot::SubtaskStatus(2));
    let list = ledger.issue(RequestSlot::TaskList);
    assert!(ledger.is_current(&a));
    assert!(ledger.is_current(&b));
    assert!(ledger.is_current(&list));
    assert!(b.seq() > a.seq());
  }

  #[test]
  fn accepted_slots_are_forgotten() {
    let mut ledger = RequestLedger::new();
    for id in 0..50 {
      let token = ledger
        .issue(RequestSlot::SubtaskStatus(id));
      assert!(ledger.accept(&token));
    }
    let list = ledger.issue(RequestSlot::TaskList);
    assert_eq!(ledger.in_flight(), 1);
    assert!(ledger.accept(&list));
    assert_eq!(ledger.in_flight(), 0);
    assert!(!ledger.accept(&list));
  }

  #[test]
  fn superseded_status_update_is_not_applied() {
    let mut ledger = RequestLedger::new();
    let mut store = TaskStore::new();
    store.apply(TaskAction::TasksLoaded(vec![
      task(1, vec![subtask(10, TaskStatus::Pending)]),
    ]));

    let first =
      ledger.issue(RequestSlot::SubtaskStatus(10));
    let second =
      ledger.issue(RequestSlot::SubtaskStatus(10));

    if ledger.accept(&second) {
      store.apply(TaskAction::SubtaskReplaced(
        subtask(10, TaskStatus::Completed)
      ));
    }
    if ledger.accept(&first) {
      store.apply(TaskAction::SubtaskReplaced(
        subtask(10, TaskStatus::InProgress)
      ));
    }

    assert_eq!(
      store.find_subtask(10).map(|(_, s)| s.status),
      Some(TaskStatus::Completed)
    );
  }

  #[test]
  fn overlapping_appends_all_land() {
    let mut store = TaskStore::new();
    store.apply(TaskAction::TasksLoaded(vec![
      task(1, vec![]),
    ]));

    store.apply(TaskAction::ProcessStarted);
    store.apply(TaskAction::ProcessStarted);
    for id in [10, 11] {
      store.apply(TaskAction::ProcessFinished);
      store.apply(TaskAction::SubtaskAdded {
        task_id: 1,
        subtask: subtask(id, TaskStatus::Pending)
      });
    }

    assert_eq!(
      store
        .task(1)
        .map(|t| t.subtasks.iter().map(|s| s.id).collect::<Vec<_>>()),
      Some(vec![10, 11])
    );
    assert!(!store.is_processing());
  }
}
