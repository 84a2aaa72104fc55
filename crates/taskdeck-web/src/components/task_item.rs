use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use taskdeck_shared::display::{
  ItemAction,
  TaskView
};
use taskdeck_shared::task::{
  SubtaskCreate,
  Task
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html,
  use_state
};

use super::{
  AddSubtaskForm,
  SubtaskItem,
  TaskCallbacks
};

#[derive(Properties, PartialEq)]
pub struct TaskItemProps {
  pub task:       Task,
  pub tz:         Tz,
  pub now:        DateTime<Utc>,
  pub processing: bool,
  pub callbacks:  TaskCallbacks
}

#[function_component(TaskItem)]
pub fn task_item(
  props: &TaskItemProps
) -> Html {
  let adding = use_state(|| false);
  let view =
    TaskView::derive(&props.task, &props.tz, props.now);
  let id = view.id;
  let callbacks = &props.callbacks;

  let toggle_adding = {
    let adding = adding.clone();
    Callback::from(move |_: MouseEvent| {
      adding.set(!*adding)
    })
  };
  let close_adding = {
    let adding = adding.clone();
    Callback::from(move |()| adding.set(false))
  };
  let on_add = {
    let on_add_subtask =
      callbacks.on_add_subtask.clone();
    let adding = adding.clone();
    Callback::from(move |payload: SubtaskCreate| {
      on_add_subtask.emit((id, payload));
      adding.set(false);
    })
  };

  let buttons = view.actions.iter().map(|action| {
    let (class, on_click) = match action {
      | ItemAction::Start => {
        ("btn", callbacks.on_start.clone())
      }
      | ItemAction::Complete => {
        ("btn ok", callbacks.on_complete.clone())
      }
      | ItemAction::Delete => {
        ("btn danger", callbacks.on_delete.clone())
      }
    };
    html! {
        <button
            class={class}
            disabled={props.processing}
            onclick={move |_| on_click.emit(id)}
        >
            { action.label() }
        </button>
    }
  });

  html! {
      <div class="card task">
          <div class="task-header">
              <span class={view.icon.class_name()}>{ view.icon.glyph() }</span>
              <div class="task-title">
                  <div class="task-name">{ &view.name }</div>
                  {
                      match &view.description {
                          | Some(desc) => html! { <div class="task-desc">{ desc }</div> },
                          | None => html! {}
                      }
                  }
              </div>
              <span class={classes!("badge", view.badge.class_name())}>{ view.status.label() }</span>
          </div>

          <div class="task-meta">
              { for view.meta.iter().map(|line| html! { <span>{ line }</span> }) }
          </div>

          <div class="subtasks">
              <div class="subtasks-header">
                  <span>{ "Subtasks" }</span>
                  <button class="btn small" onclick={toggle_adding}>
                      { if *adding { "Cancel" } else { "Add Subtask" } }
                  </button>
              </div>
              {
                  if *adding {
                      html! {
                          <AddSubtaskForm
                              disabled={props.processing}
                              on_submit={on_add}
                              on_cancel={close_adding}
                          />
                      }
                  } else {
                      html! {}
                  }
              }
              <ul class="subtask-list">
                  {
                      for view.subtasks.iter().cloned().map(|sub| html! {
                          <SubtaskItem
                              key={sub.id}
                              view={sub.clone()}
                              processing={props.processing}
                              on_toggle={callbacks.on_toggle_subtask.clone()}
                              on_delete={callbacks.on_delete_subtask.clone()}
                          />
                      })
                  }
              </ul>
          </div>

          <div class="actions">
              { for buttons }
          </div>
      </div>
  }
}
