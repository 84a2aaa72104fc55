use taskdeck_shared::forms::TaskDraft;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
  HtmlInputElement,
  HtmlTextAreaElement
};
use yew::{
  Callback,
  Html,
  InputEvent,
  MouseEvent,
  Properties,
  SubmitEvent,
  TargetCast,
  function_component,
  html,
  use_state
};

use crate::hooks::TaskManagerHandle;

#[derive(Properties, PartialEq)]
pub struct TaskFormProps {
  pub manager: TaskManagerHandle
}

/// Edits one field of the draft held in
/// `draft` from an input event.
fn bind_field<E>(
  draft: &yew::UseStateHandle<TaskDraft>,
  apply: fn(&mut TaskDraft, String)
) -> Callback<InputEvent>
where
  E: AsRef<web_sys::EventTarget>
    + wasm_bindgen::JsCast
    + ValueOf
{
  let draft = draft.clone();
  Callback::from(move |e: InputEvent| {
    let target: E = e.target_unchecked_into();
    let mut next = (*draft).clone();
    apply(&mut next, target.value_of());
    draft.set(next);
  })
}

trait ValueOf {
  fn value_of(&self) -> String;
}

impl ValueOf for HtmlInputElement {
  fn value_of(&self) -> String {
    self.value()
  }
}

impl ValueOf for HtmlTextAreaElement {
  fn value_of(&self) -> String {
    self.value()
  }
}

#[function_component(TaskForm)]
pub fn task_form(
  props: &TaskFormProps
) -> Html {
  let draft = use_state(TaskDraft::default);
  let form_error = use_state(|| None::<String>);
  let submitting =
    props.manager.store().is_submitting();

  let on_name = bind_field::<HtmlInputElement>(
    &draft,
    |d, v| d.name = v
  );
  let on_description =
    bind_field::<HtmlTextAreaElement>(
      &draft,
      |d, v| d.description = v
    );
  let on_sub_title = bind_field::<HtmlInputElement>(
    &draft,
    |d, v| d.pending.title = v
  );
  let on_sub_description =
    bind_field::<HtmlInputElement>(
      &draft,
      |d, v| d.pending.description = v
    );

  let on_add_subtask = {
    let draft = draft.clone();
    let form_error = form_error.clone();
    Callback::from(move |_: MouseEvent| {
      let mut next = (*draft).clone();
      match next.add_subtask() {
        | Ok(()) => {
          draft.set(next);
          form_error.set(None);
        }
        | Err(err) => {
          form_error.set(Some(err.to_string()))
        }
      }
    })
  };

  let onsubmit = {
    let draft = draft.clone();
    let form_error = form_error.clone();
    let manager = props.manager.clone();
    Callback::from(move |e: SubmitEvent| {
      e.prevent_default();
      let payload = match draft.to_payload() {
        | Ok(payload) => payload,
        | Err(err) => {
          form_error.set(Some(err.to_string()));
          return;
        }
      };
      form_error.set(None);

      let draft = draft.clone();
      let manager = manager.clone();
      spawn_local(async move {
        // The draft survives a failed create.
        if manager.create_task(payload).await.is_ok() {
          let mut next = (*draft).clone();
          next.reset();
          draft.set(next);
        }
      });
    })
  };

  let added = draft.subtasks.iter().enumerate().map(|(index, sub)| {
    let draft = draft.clone();
    let on_remove = Callback::from(move |_: MouseEvent| {
      let mut next = (*draft).clone();
      if let Err(err) = next.remove_subtask(index) {
        tracing::warn!(%err, "subtask draft already gone");
        return;
      }
      draft.set(next);
    });
    html! {
        <li class="draft-subtask">
            <span>{ &sub.title }</span>
            {
                if sub.description.trim().is_empty() {
                    html! {}
                } else {
                    html! { <span class="muted">{ format!(" - {}", sub.description.trim()) }</span> }
                }
            }
            <button class="btn small danger" type="button" onclick={on_remove}>{ "Remove" }</button>
        </li>
    }
  });

  html! {
      <form class="card task-form" {onsubmit}>
          <div class="header">{ "Create New Task" }</div>
          <input
              class="input"
              placeholder="Task name"
              value={draft.name.clone()}
              oninput={on_name}
          />
          <textarea
              class="input"
              rows="3"
              placeholder="Description (optional)"
              value={draft.description.clone()}
              oninput={on_description}
          />

          <div class="subtask-drafts">
              <div class="subtasks-header">{ format!("Subtasks ({})", draft.subtasks.len()) }</div>
              <ul>{ for added }</ul>
              <div class="row">
                  <input
                      class="input"
                      placeholder="Subtask title"
                      value={draft.pending.title.clone()}
                      oninput={on_sub_title}
                  />
                  <input
                      class="input"
                      placeholder="Subtask description"
                      value={draft.pending.description.clone()}
                      oninput={on_sub_description}
                  />
                  <button class="btn" type="button" onclick={on_add_subtask}>{ "Add" }</button>
              </div>
          </div>

          {
              match &*form_error {
                  | Some(message) => html! { <div class="form-error">{ message }</div> },
                  | None => html! {}
              }
          }

          <button class="btn ok" type="submit" disabled={submitting}>
              { if submitting { "Creating..." } else { "Create Task" } }
          </button>
      </form>
  }
}
