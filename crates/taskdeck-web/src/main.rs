mod api;
mod app;
mod components;
mod hooks;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting Taskdeck web frontend"
  );

  let mount = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .and_then(|document| {
      document.get_element_by_id("app")
    });

  match mount {
    | Some(mount) => {
      yew::Renderer::<app::App>::with_root(
        mount
      )
      .render();
    }
    | None => {
      tracing::warn!(
        "missing #app mount element, \
         rendering into body"
      );
      yew::Renderer::<app::App>::new()
        .render();
    }
  }
}
