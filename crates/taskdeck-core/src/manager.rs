use taskdeck_shared::store::{
  RequestLedger,
  RequestSlot,
  RequestToken,
  TaskAction,
  TaskStore
};
use taskdeck_shared::task::{
  AnalyticsSummary,
  SubtaskCreate,
  Task,
  TaskCreate,
  TaskStatus
};
use tracing::{
  debug,
  error,
  info,
  instrument
};

use crate::api::{
  ApiError,
  TaskBackend
};

pub const FETCH_FAILED: &str =
  "Failed to fetch tasks";
pub const ANALYTICS_FETCH_FAILED: &str =
  "Failed to fetch tasks for analytics";
pub const CREATE_FAILED: &str =
  "Failed to create task";
pub const START_FAILED: &str =
  "Failed to start task";
pub const COMPLETE_FAILED: &str =
  "Failed to complete task";
pub const DELETE_FAILED: &str =
  "Failed to delete task";
pub const ADD_SUBTASK_FAILED: &str =
  "Failed to add subtask";
pub const UPDATE_SUBTASK_FAILED: &str =
  "Failed to update subtask";
pub const DELETE_SUBTASK_FAILED: &str =
  "Failed to delete subtask";

/// Owns the task store for one page and
/// turns backend results into store
/// actions. Failures land in the store's
/// error slot as a short message.
pub struct TaskManager<B> {
  backend:   B,
  page_name: String,
  store:     TaskStore,
  ledger:    RequestLedger
}

impl<B: TaskBackend> TaskManager<B> {
  pub fn new(
    backend: B,
    page_name: impl Into<String>
  ) -> Self {
    Self {
      backend,
      page_name: page_name.into(),
      store: TaskStore::new(),
      ledger: RequestLedger::new()
    }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn page_name(&self) -> &str {
    &self.page_name
  }

  pub fn store(&self) -> &TaskStore {
    &self.store
  }

  pub fn tasks(&self) -> &[Task] {
    self.store.tasks()
  }

  pub fn error(&self) -> Option<&str> {
    self.store.error()
  }

  fn fail(
    &mut self,
    message: &str,
    err: &ApiError
  ) {
    error!(
      page = %self.page_name,
      error = %err,
      detail = ?err,
      "{message}"
    );
    self
      .store
      .apply(TaskAction::Failed(message.to_string()));
  }

  fn accept(
    &mut self,
    token: &RequestToken
  ) -> bool {
    self.ledger.accept(token)
  }

  fn load(
    &mut self,
    slot: RequestSlot,
    failure: &str
  ) {
    self.store.apply(TaskAction::ClearError);
    let token = self.ledger.issue(slot);
    let result = match slot {
      | RequestSlot::AllTasks => {
        self.backend.list_all_tasks()
      }
      | _ => {
        self
          .backend
          .list_page_tasks(&self.page_name)
      }
    };

    if !self.accept(&token) {
      return;
    }

    match result {
      | Ok(tasks) => {
        self
          .store
          .apply(TaskAction::TasksLoaded(tasks));
      }
      | Err(err) => {
        error!(
          page = %self.page_name,
          error = %err,
          detail = ?err,
          "{failure}"
        );
        self.store.apply(TaskAction::LoadFailed(
          failure.to_string()
        ));
      }
    }
  }

  #[instrument(skip(self), fields(page = %self.page_name))]
  pub fn fetch_tasks(&mut self) {
    self.load(RequestSlot::TaskList, FETCH_FAILED);
  }

  #[instrument(skip(self))]
  pub fn fetch_all_tasks_for_analytics(
    &mut self
  ) {
    self.load(
      RequestSlot::AllTasks,
      ANALYTICS_FETCH_FAILED
    );
  }

  /// Shows the loading state again, then
  /// refetches the page.
  pub fn refresh_tasks(&mut self) {
    self.store.apply(TaskAction::LoadingStarted);
    self.fetch_tasks();
  }

  /// Creates a task and refreshes the
  /// list. The error is returned as well
  /// as recorded so a form can keep its
  /// input.
  #[instrument(skip(self, payload), fields(name = %payload.name))]
  pub fn create_task(
    &mut self,
    payload: &TaskCreate
  ) -> Result<Task, ApiError> {
    self.store.apply(TaskAction::SubmitStarted);
    let result = self
      .backend
      .create_task(&self.page_name, payload);
    self.store.apply(TaskAction::SubmitFinished);

    match result {
      | Ok(task) => {
        info!(task_id = task.id, "task created");
        self.fetch_tasks();
        Ok(task)
      }
      | Err(err) => {
        self.fail(CREATE_FAILED, &err);
        Err(err)
      }
    }
  }

  fn mutate_task<F>(
    &mut self,
    failure: &str,
    call: F
  ) where
    F: FnOnce(&B, &str) -> Result<(), ApiError>
  {
    self.store.apply(TaskAction::ProcessStarted);
    let result =
      call(&self.backend, &self.page_name);
    self.store.apply(TaskAction::ProcessFinished);

    match result {
      | Ok(()) => self.fetch_tasks(),
      | Err(err) => self.fail(failure, &err)
    }
  }

  #[instrument(skip(self))]
  pub fn start_task(&mut self, task_id: u64) {
    self.mutate_task(
      START_FAILED,
      |backend, page| {
        backend
          .start_task(page, task_id)
          .map(|_| ())
      }
    );
  }

  #[instrument(skip(self))]
  pub fn complete_task(
    &mut self,
    task_id: u64
  ) {
    self.mutate_task(
      COMPLETE_FAILED,
      |backend, page| {
        backend
          .complete_task(page, task_id)
          .map(|_| ())
      }
    );
  }

  #[instrument(skip(self))]
  pub fn delete_task(&mut self, task_id: u64) {
    self.mutate_task(
      DELETE_FAILED,
      |backend, page| {
        backend.delete_task(page, task_id)
      }
    );
  }

  #[instrument(skip(self, payload), fields(title = %payload.title))]
  pub fn add_subtask(
    &mut self,
    task_id: u64,
    payload: &SubtaskCreate
  ) {
    self.store.apply(TaskAction::ProcessStarted);
    let result =
      self.backend.add_subtask(task_id, payload);
    self.store.apply(TaskAction::ProcessFinished);

    match result {
      | Ok(subtask) => {
        debug!(subtask_id = subtask.id, "subtask added");
        self.store.apply(TaskAction::SubtaskAdded {
          task_id,
          subtask
        });
      }
      | Err(err) => {
        self.fail(ADD_SUBTASK_FAILED, &err)
      }
    }
  }

  #[instrument(skip(self))]
  pub fn update_subtask_status(
    &mut self,
    subtask_id: u64,
    status: TaskStatus
  ) {
    self.store.apply(TaskAction::ProcessStarted);
    let token = self
      .ledger
      .issue(RequestSlot::SubtaskStatus(subtask_id));
    let result = self
      .backend
      .update_subtask_status(subtask_id, status);
    self.store.apply(TaskAction::ProcessFinished);

    // A superseded success would undo a
    // newer status; failures still show.
    let current = self.accept(&token);
    match result {
      | Ok(subtask) if current => {
        self
          .store
          .apply(TaskAction::SubtaskReplaced(subtask));
      }
      | Ok(_) => {}
      | Err(err) => {
        self.fail(UPDATE_SUBTASK_FAILED, &err)
      }
    }
  }

  /// Moves a loaded subtask one step
  /// around its status cycle.
  #[instrument(skip(self))]
  pub fn toggle_subtask_status(
    &mut self,
    subtask_id: u64
  ) {
    let next = self
      .store
      .find_subtask(subtask_id)
      .map(|(_, s)| s.status.next_subtask_status());
    match next {
      | Some(status) => {
        self.update_subtask_status(
          subtask_id, status
        )
      }
      | None => {
        error!(
          subtask_id,
          "subtask is not on this page"
        );
        self.store.apply(TaskAction::Failed(
          UPDATE_SUBTASK_FAILED.to_string()
        ));
      }
    }
  }

  #[instrument(skip(self))]
  pub fn delete_subtask(
    &mut self,
    subtask_id: u64
  ) {
    self.store.apply(TaskAction::ProcessStarted);
    let result =
      self.backend.delete_subtask(subtask_id);
    self.store.apply(TaskAction::ProcessFinished);

    match result {
      | Ok(()) => {
        self.store.apply(TaskAction::SubtaskRemoved {
          subtask_id
        });
      }
      | Err(err) => {
        self.fail(DELETE_SUBTASK_FAILED, &err)
      }
    }
  }

  /// Server-side counts; not part of the
  /// store.
  pub fn analytics(
    &self
  ) -> Result<AnalyticsSummary, ApiError> {
    self.backend.analytics()
  }
}
