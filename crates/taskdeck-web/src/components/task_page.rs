use chrono::Utc;
use chrono_tz::Tz;
use taskdeck_shared::pages::PageContext;
use taskdeck_shared::task::SubtaskCreate;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html,
  use_effect_with
};

use super::{
  ErrorBanner,
  TaskCallbacks,
  TaskForm,
  TaskList
};
use crate::hooks::use_task_manager;

#[derive(Properties, PartialEq)]
pub struct TaskPageProps {
  pub page: PageContext,
  pub tz:   Tz
}

#[function_component(TaskPage)]
pub fn task_page(
  props: &TaskPageProps
) -> Html {
  let manager =
    use_task_manager(&props.page.page_name);

  {
    let manager = manager.clone();
    use_effect_with(
      props.page.page_name.clone(),
      move |page_name| {
        tracing::info!(
          page = %page_name,
          "loading page tasks"
        );
        manager.refresh_tasks();
        || ()
      }
    );
  }

  let callbacks = {
    let start = manager.clone();
    let complete = manager.clone();
    let delete = manager.clone();
    let add = manager.clone();
    let toggle = manager.clone();
    let remove = manager.clone();
    TaskCallbacks {
      on_start:          Callback::from(move |id| {
        start.start_task(id)
      }),
      on_complete:       Callback::from(move |id| {
        complete.complete_task(id)
      }),
      on_delete:         Callback::from(move |id| {
        delete.delete_task(id)
      }),
      on_add_subtask:    Callback::from(
        move |(id, payload): (u64, SubtaskCreate)| {
          add.add_subtask(id, payload)
        }
      ),
      on_toggle_subtask: Callback::from(move |id| {
        toggle.toggle_subtask_status(id)
      }),
      on_delete_subtask: Callback::from(move |id| {
        remove.delete_subtask(id)
      })
    }
  };

  let on_retry = {
    let manager = manager.clone();
    Callback::from(move |()| manager.refresh_tasks())
  };

  let store = manager.store();
  let body = if store.is_loading() {
    html! { <div class="loading">{ "Loading tasks..." }</div> }
  } else {
    html! {
        <TaskList
            tasks={store.tasks().to_vec()}
            empty_message={props.page.empty_message.clone()}
            tz={props.tz}
            now={Utc::now()}
            processing={store.is_processing()}
            callbacks={callbacks}
        />
    }
  };

  html! {
      <div class="page">
          <div class="page-header">
              <h1>{ &props.page.title }</h1>
              <button class="btn" onclick={on_retry.reform(|_: MouseEvent| ())}>{ "Refresh" }</button>
          </div>
          <ErrorBanner
              message={store.error().map(str::to_string)}
              on_retry={on_retry.clone()}
          />
          <TaskForm manager={manager.clone()} />
          { body }
      </div>
  }
}
