use chrono_tz::Tz;
use taskdeck_shared::pages::{
  PageContext,
  find_page
};
use yew::{
  Html,
  function_component,
  html,
  use_memo
};
use yew_router::prelude::{
  BrowserRouter,
  Routable,
  Switch
};

use crate::api::browser_timezone;
use crate::components::{
  DashboardView,
  Sidebar,
  TaskPage
};

#[derive(Debug, Clone, PartialEq, Routable)]
pub enum Route {
  #[at("/")]
  Dashboard,
  #[at("/:slug")]
  Page { slug: String },
  #[not_found]
  #[at("/404")]
  NotFound
}

fn switch(route: Route, tz: Tz) -> Html {
  match route {
    | Route::Dashboard => {
      html! { <DashboardView {tz} /> }
    }
    | Route::Page {
      slug
    } => match find_page(&slug) {
      | Some(page) => {
        html! {
            <TaskPage key={page.slug} page={PageContext::from(page)} {tz} />
        }
      }
      | None => {
        tracing::debug!(slug = %slug, "no such page");
        not_found()
      }
    },
    | Route::NotFound => not_found()
  }
}

fn not_found() -> Html {
  html! {
      <div class="page">
          <h1>{ "Page not found" }</h1>
      </div>
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let tz = *use_memo((), |_| browser_timezone());
  tracing::debug!(%tz, "display timezone");

  html! {
      <BrowserRouter>
          <div class="shell">
              <Sidebar />
              <main class="content">
                  <Switch<Route> render={move |route| switch(route, tz)} />
              </main>
          </div>
      </BrowserRouter>
  }
}
