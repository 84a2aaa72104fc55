use taskdeck_shared::pages::{
  PageGroup,
  pages_in
};
use yew::{
  Html,
  classes,
  function_component,
  html
};
use yew_router::prelude::{
  Link,
  use_route
};

use crate::app::Route;

#[function_component(Sidebar)]
pub fn sidebar() -> Html {
  let current = use_route::<Route>();

  let item = |route: Route, label: &'static str| {
    let class = if current.as_ref() == Some(&route) {
      "item active"
    } else {
      "item"
    };
    html! {
        <Link<Route> classes={classes!(class)} to={route}>{ label }</Link<Route>>
    }
  };

  html! {
      <nav class="panel sidebar">
          <div class="header">{ "Taskdeck" }</div>
          { item(Route::Dashboard, "Dashboard") }
          {
              for PageGroup::ALL.into_iter().map(|group| html! {
                  <div class="group">
                      <div class="group-label">{ group.label() }</div>
                      {
                          for pages_in(group).map(|page| item(
                              Route::Page { slug: page.slug.to_string() },
                              page.nav_label,
                          ))
                      }
                  </div>
              })
          }
      </nav>
  }
}
