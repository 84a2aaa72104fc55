use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use taskdeck_shared::endpoints::ApiRoots;
use taskdeck_shared::store::{
  RequestLedger,
  RequestSlot,
  RequestToken,
  TaskAction,
  TaskStore
};
use taskdeck_shared::task::{
  SubtaskCreate,
  Task,
  TaskCreate,
  TaskStatus
};
use wasm_bindgen_futures::spawn_local;
use yew::{
  Reducible,
  UseReducerHandle,
  hook,
  use_memo,
  use_mut_ref,
  use_reducer
};

use crate::api;

const FETCH_FAILED: &str =
  "Failed to fetch tasks";
const ANALYTICS_FETCH_FAILED: &str =
  "Failed to fetch tasks for analytics";
const CREATE_FAILED: &str =
  "Failed to create task";
const START_FAILED: &str =
  "Failed to start task";
const COMPLETE_FAILED: &str =
  "Failed to complete task";
const DELETE_FAILED: &str =
  "Failed to delete task";
const ADD_SUBTASK_FAILED: &str =
  "Failed to add subtask";
const UPDATE_SUBTASK_FAILED: &str =
  "Failed to update subtask";
const DELETE_SUBTASK_FAILED: &str =
  "Failed to delete subtask";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreState(TaskStore);

impl Reducible for StoreState {
  type Action = TaskAction;

  fn reduce(
    self: Rc<Self>,
    action: TaskAction
  ) -> Rc<Self> {
    let mut next = Rc::unwrap_or_clone(self);
    next.0.apply(action);
    Rc::new(next)
  }
}

/// Store snapshot plus the operations
/// that drive it for one page.
#[derive(Clone)]
pub struct TaskManagerHandle {
  page_name: Rc<str>,
  store:     UseReducerHandle<StoreState>,
  ledger:    Rc<RefCell<RequestLedger>>,
  roots:     Rc<ApiRoots>
}

impl PartialEq for TaskManagerHandle {
  fn eq(&self, other: &Self) -> bool {
    self.page_name == other.page_name
      && self.store == other.store
  }
}

#[hook]
pub fn use_task_manager(
  page_name: &str
) -> TaskManagerHandle {
  let store = use_reducer(StoreState::default);
  let ledger =
    use_mut_ref(RequestLedger::new);
  let roots =
    use_memo((), |_| api::configured_roots());

  TaskManagerHandle {
    page_name: Rc::from(page_name),
    store,
    ledger,
    roots
  }
}

impl TaskManagerHandle {
  pub fn store(&self) -> &TaskStore {
    &self.store.0
  }

  pub fn roots(&self) -> Rc<ApiRoots> {
    self.roots.clone()
  }

  fn dispatch(&self, action: TaskAction) {
    self.store.dispatch(action);
  }

  fn issue(
    &self,
    slot: RequestSlot
  ) -> RequestToken {
    self.ledger.borrow_mut().issue(slot)
  }

  fn accept(
    &self,
    token: &RequestToken
  ) -> bool {
    self.ledger.borrow_mut().accept(token)
  }

  fn fail(
    &self,
    message: &str,
    err: &str
  ) {
    tracing::error!(
      page = %self.page_name,
      error = err,
      "{message}"
    );
    self.dispatch(TaskAction::Failed(
      message.to_string()
    ));
  }

  fn load(
    &self,
    slot: RequestSlot,
    failure: &'static str
  ) {
    self.dispatch(TaskAction::ClearError);
    let token = self.issue(slot);
    let this = self.clone();

    spawn_local(async move {
      let result = match slot {
        | RequestSlot::AllTasks => {
          api::list_all_tasks(&this.roots)
            .await
        }
        | _ => {
          api::list_page_tasks(
            &this.roots,
            &this.page_name
          )
          .await
        }
      };

      if !this.accept(&token) {
        return;
      }
      match result {
        | Ok(tasks) => {
          this.dispatch(
            TaskAction::TasksLoaded(tasks)
          );
        }
        | Err(err) => {
          tracing::error!(
            page = %this.page_name,
            error = %err,
            "{failure}"
          );
          this.dispatch(TaskAction::LoadFailed(
            failure.to_string()
          ));
        }
      }
    });
  }

  pub fn fetch_tasks(&self) {
    self.load(RequestSlot::TaskList, FETCH_FAILED);
  }

  pub fn fetch_all_tasks_for_analytics(
    &self
  ) {
    self.load(
      RequestSlot::AllTasks,
      ANALYTICS_FETCH_FAILED
    );
  }

  pub fn refresh_tasks(&self) {
    self.dispatch(TaskAction::LoadingStarted);
    self.fetch_tasks();
  }

  /// Resolves with the error so the form
  /// can keep what was typed.
  pub async fn create_task(
    &self,
    payload: TaskCreate
  ) -> Result<Task, String> {
    self.dispatch(TaskAction::SubmitStarted);
    let result = api::create_task(
      &self.roots,
      &self.page_name,
      &payload
    )
    .await;
    self.dispatch(TaskAction::SubmitFinished);

    match result {
      | Ok(task) => {
        tracing::info!(
          task_id = task.id,
          "task created"
        );
        self.fetch_tasks();
        Ok(task)
      }
      | Err(err) => {
        self.fail(CREATE_FAILED, &err);
        Err(err)
      }
    }
  }

  fn mutate<F, Fut, T>(
    &self,
    failure: &'static str,
    call: F,
    on_ok: impl FnOnce(&Self, T) + 'static
  ) where
    F: FnOnce(Rc<ApiRoots>, Rc<str>) -> Fut,
    Fut: Future<Output = Result<T, String>>
      + 'static,
    T: 'static
  {
    self.dispatch(TaskAction::ProcessStarted);
    let this = self.clone();
    let request = call(
      self.roots.clone(),
      self.page_name.clone()
    );

    spawn_local(async move {
      let result = request.await;
      this.dispatch(TaskAction::ProcessFinished);
      match result {
        | Ok(value) => on_ok(&this, value),
        | Err(err) => this.fail(failure, &err)
      }
    });
  }

  pub fn start_task(&self, task_id: u64) {
    self.mutate(
      START_FAILED,
      move |roots, page| async move {
        api::start_task(&roots, &page, task_id)
          .await
      },
      |this, _| this.fetch_tasks()
    );
  }

  pub fn complete_task(&self, task_id: u64) {
    self.mutate(
      COMPLETE_FAILED,
      move |roots, page| async move {
        api::complete_task(&roots, &page, task_id)
          .await
      },
      |this, _| this.fetch_tasks()
    );
  }

  pub fn delete_task(&self, task_id: u64) {
    self.mutate(
      DELETE_FAILED,
      move |roots, page| async move {
        api::delete_task(&roots, &page, task_id)
          .await
      },
      |this, ()| this.fetch_tasks()
    );
  }

  pub fn add_subtask(
    &self,
    task_id: u64,
    payload: SubtaskCreate
  ) {
    self.mutate(
      ADD_SUBTASK_FAILED,
      move |roots, _| async move {
        api::add_subtask(&roots, task_id, &payload)
          .await
      },
      move |this, subtask| {
        this.dispatch(TaskAction::SubtaskAdded {
          task_id,
          subtask
        })
      }
    );
  }

  pub fn update_subtask_status(
    &self,
    subtask_id: u64,
    status: TaskStatus
  ) {
    self.dispatch(TaskAction::ProcessStarted);
    let token = self.issue(
      RequestSlot::SubtaskStatus(subtask_id)
    );
    let this = self.clone();

    spawn_local(async move {
      let result = api::update_subtask_status(
        &this.roots,
        subtask_id,
        status
      )
      .await;
      this.dispatch(TaskAction::ProcessFinished);

      let current = this.accept(&token);
      match result {
        | Ok(subtask) if current => {
          this.dispatch(
            TaskAction::SubtaskReplaced(subtask)
          )
        }
        | Ok(_) => {}
        | Err(err) => {
          this.fail(UPDATE_SUBTASK_FAILED, &err)
        }
      }
    });
  }

  pub fn toggle_subtask_status(
    &self,
    subtask_id: u64
  ) {
    let next = self
      .store()
      .find_subtask(subtask_id)
      .map(|(_, s)| s.status.next_subtask_status());
    match next {
      | Some(status) => {
        self.update_subtask_status(
          subtask_id, status
        )
      }
      | None => {
        self.fail(
          UPDATE_SUBTASK_FAILED,
          "subtask is not on this page"
        )
      }
    }
  }

  pub fn delete_subtask(
    &self,
    subtask_id: u64
  ) {
    self.mutate(
      DELETE_SUBTASK_FAILED,
      move |roots, _| async move {
        api::delete_subtask(&roots, subtask_id)
          .await
      },
      move |this, ()| {
        this.dispatch(
          TaskAction::SubtaskRemoved {
            subtask_id
          }
        )
      }
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reducer_applies_actions_to_a_copy() {
    let before = Rc::new(StoreState::default());
    let after = before.clone().reduce(
      TaskAction::LoadFailed(
        FETCH_FAILED.to_string()
      )
    );

    assert!(before.0.is_loading());
    assert!(!after.0.is_loading());
    assert_eq!(after.0.error(), Some(FETCH_FAILED));
  }
}
