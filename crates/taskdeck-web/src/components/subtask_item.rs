use taskdeck_shared::display::SubtaskView;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct SubtaskItemProps {
  pub view:       SubtaskView,
  pub processing: bool,
  pub on_toggle:  Callback<u64>,
  pub on_delete:  Callback<u64>
}

#[function_component(SubtaskItem)]
pub fn subtask_item(
  props: &SubtaskItemProps
) -> Html {
  let view = &props.view;
  let id = view.id;
  let on_toggle = props.on_toggle.clone();
  let on_delete = props.on_delete.clone();
  let toggle_title =
    format!("Mark as {}", view.next_status);

  html! {
      <li class={classes!("subtask", view.tone.class_name())}>
          <button
              class="subtask-toggle"
              title={toggle_title}
              disabled={props.processing}
              onclick={move |_| on_toggle.emit(id)}
          >
              <span class={view.icon.class_name()}>{ view.icon.glyph() }</span>
          </button>
          <div class="subtask-content">
              <div class="subtask-title">{ &view.title }</div>
              {
                  match &view.description {
                      | Some(desc) => html! { <div class="subtask-desc">{ desc }</div> },
                      | None => html! {}
                  }
              }
              {
                  if view.duration.is_empty() {
                      html! {}
                  } else {
                      html! { <div class="subtask-meta">{ &view.duration }</div> }
                  }
              }
          </div>
          <button
              class="btn danger small"
              disabled={props.processing}
              onclick={move |_| on_delete.emit(id)}
          >
              { "Delete" }
          </button>
      </li>
  }
}
