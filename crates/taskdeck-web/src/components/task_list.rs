use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use taskdeck_shared::task::{
  SubtaskCreate,
  Task
};
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

use super::TaskItem;

/// Item-level events, bundled so they
/// pass through the list in one prop.
#[derive(Clone, PartialEq)]
pub struct TaskCallbacks {
  pub on_start:          Callback<u64>,
  pub on_complete:       Callback<u64>,
  pub on_delete:         Callback<u64>,
  pub on_add_subtask:
    Callback<(u64, SubtaskCreate)>,
  pub on_toggle_subtask: Callback<u64>,
  pub on_delete_subtask: Callback<u64>
}

#[derive(Properties, PartialEq)]
pub struct TaskListProps {
  pub tasks:         Vec<Task>,
  pub empty_message: String,
  pub tz:            Tz,
  pub now:           DateTime<Utc>,
  pub processing:    bool,
  pub callbacks:     TaskCallbacks
}

#[function_component(TaskList)]
pub fn task_list(
  props: &TaskListProps
) -> Html {
  if props.tasks.is_empty() {
    return html! {
        <div class="empty">{ &props.empty_message }</div>
    };
  }

  html! {
      <div class="task-list">
          {
              for props.tasks.iter().map(|task| html! {
                  <TaskItem
                      key={task.id}
                      task={task.clone()}
                      tz={props.tz}
                      now={props.now}
                      processing={props.processing}
                      callbacks={props.callbacks.clone()}
                  />
              })
          }
      </div>
  }
}
