use taskdeck_shared::forms::SubtaskDraft;
use taskdeck_shared::task::SubtaskCreate;
use web_sys::{
  HtmlInputElement,
  HtmlTextAreaElement
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  SubmitEvent,
  TargetCast,
  function_component,
  html,
  use_state
};

#[derive(Properties, PartialEq)]
pub struct AddSubtaskFormProps {
  pub disabled:  bool,
  pub on_submit: Callback<SubtaskCreate>,
  pub on_cancel: Callback<()>
}

#[function_component(AddSubtaskForm)]
pub fn add_subtask_form(
  props: &AddSubtaskFormProps
) -> Html {
  let draft = use_state(SubtaskDraft::default);
  let error = use_state(|| None::<String>);

  let on_title = {
    let draft = draft.clone();
    Callback::from(move |e: yew::InputEvent| {
      let input: HtmlInputElement =
        e.target_unchecked_into();
      let mut next = (*draft).clone();
      next.title = input.value();
      draft.set(next);
    })
  };

  let on_description = {
    let draft = draft.clone();
    Callback::from(move |e: yew::InputEvent| {
      let input: HtmlTextAreaElement =
        e.target_unchecked_into();
      let mut next = (*draft).clone();
      next.description = input.value();
      draft.set(next);
    })
  };

  let onsubmit = {
    let draft = draft.clone();
    let error = error.clone();
    let on_submit = props.on_submit.clone();
    Callback::from(move |e: SubmitEvent| {
      e.prevent_default();
      match draft.to_payload() {
        | Ok(payload) => {
          on_submit.emit(payload);
          let mut cleared = (*draft).clone();
          cleared.clear();
          draft.set(cleared);
          error.set(None);
        }
        | Err(err) => error.set(Some(err.to_string()))
      }
    })
  };

  let on_cancel = {
    let on_cancel = props.on_cancel.clone();
    let draft = draft.clone();
    Callback::from(move |_: MouseEvent| {
      draft.set(SubtaskDraft::default());
      on_cancel.emit(());
    })
  };

  html! {
      <form class="subtask-form" {onsubmit}>
          <input
              class="input"
              placeholder="Subtask title"
              value={draft.title.clone()}
              oninput={on_title}
          />
          <textarea
              class="input"
              rows="2"
              placeholder="Description (optional)"
              value={draft.description.clone()}
              oninput={on_description}
          />
          {
              match &*error {
                  | Some(message) => html! { <div class="form-error">{ message }</div> },
                  | None => html! {}
              }
          }
          <div class="actions">
              <button class="btn" type="button" onclick={on_cancel}>{ "Cancel" }</button>
              <button class="btn ok" type="submit" disabled={props.disabled}>{ "Add subtask" }</button>
          </div>
      </form>
  }
}
