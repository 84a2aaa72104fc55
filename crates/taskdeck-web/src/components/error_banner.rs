use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct ErrorBannerProps {
  pub message:  Option<String>,
  #[prop_or_default]
  pub on_retry: Option<Callback<()>>
}

#[function_component(ErrorBanner)]
pub fn error_banner(
  props: &ErrorBannerProps
) -> Html {
  let Some(message) = &props.message else {
    return html! {};
  };

  let retry = props.on_retry.clone().map(|on_retry| {
    html! {
        <button class="btn" onclick={move |_| on_retry.emit(())}>{ "Retry" }</button>
    }
  });

  html! {
      <div class="alert error" role="alert">
          <span>{ message }</span>
          { for retry }
      </div>
  }
}
