use chrono::Utc;
use chrono_tz::Tz;
use taskdeck_shared::dashboard::{
  Dashboard,
  DashboardClock,
  DashboardSettings,
  ProductivityBand,
  TimeWindow
};
use taskdeck_shared::datetime::format_day;
use taskdeck_shared::task::AnalyticsSummary;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlSelectElement;
use yew::{
  Callback,
  Event,
  Html,
  Properties,
  TargetCast,
  function_component,
  html,
  use_effect_with,
  use_state
};

use super::ErrorBanner;
use crate::api;
use crate::hooks::use_task_manager;

const TIMELINE_ROWS: usize = 10;

#[derive(Properties, PartialEq)]
pub struct DashboardViewProps {
  pub tz: Tz
}

fn band_class(band: ProductivityBand) -> &'static str {
  match band {
    | ProductivityBand::High => "score high",
    | ProductivityBand::Fair => "score fair",
    | ProductivityBand::Low => "score low"
  }
}

fn percent(value: f64) -> String {
  format!("{value:.1}%")
}

fn stat(label: &str, value: String) -> Html {
  html! {
      <div class="card stat">
          <div class="stat-label">{ label }</div>
          <div class="stat-value">{ value }</div>
      </div>
  }
}

#[function_component(DashboardView)]
pub fn dashboard_view(
  props: &DashboardViewProps
) -> Html {
  let manager = use_task_manager("");
  let window = use_state(TimeWindow::default);
  let summary =
    use_state(|| None::<AnalyticsSummary>);

  {
    let manager = manager.clone();
    let summary = summary.clone();
    use_effect_with((), move |_| {
      manager.fetch_all_tasks_for_analytics();
      let roots = manager.roots();
      spawn_local(async move {
        match api::analytics(&roots).await {
          | Ok(counts) => summary.set(Some(counts)),
          | Err(err) => {
            tracing::warn!(
              error = %err,
              "analytics summary unavailable"
            )
          }
        }
      });
      || ()
    });
  }

  let on_window = {
    let window = window.clone();
    Callback::from(move |e: Event| {
      let select: HtmlSelectElement =
        e.target_unchecked_into();
      match select.value().parse::<TimeWindow>() {
        | Ok(next) => window.set(next),
        | Err(err) => {
          tracing::warn!(%err, "ignoring window")
        }
      }
    })
  };

  let store = manager.store();
  let error = html! {
      <ErrorBanner message={store.error().map(str::to_string)} />
  };
  if store.is_loading() {
    return html! {
        <div class="page">
            { error }
            <div class="loading">{ "Loading dashboard..." }</div>
        </div>
    };
  }

  let clock = DashboardClock::new(Utc::now(), props.tz);
  let dash = Dashboard::compute(
    store.tasks(),
    *window,
    &clock,
    &DashboardSettings::default()
  );
  let stats = &dash.stats;
  let tz = props.tz;

  let server_counts = (*summary).as_ref().map(|s| html! {
      <div class="muted">
          { format!(
              "Server totals: {} tasks ({} pending, {} in progress, {} completed), {} with subtasks",
              s.overall.total,
              s.overall.pending,
              s.overall.in_progress,
              s.overall.completed,
              s.by_subtasks.with_subtasks,
          ) }
      </div>
  });

  html! {
      <div class="page dashboard">
          <div class="page-header">
              <h1>{ "Dashboard" }</h1>
              <select onchange={on_window}>
                  {
                      for TimeWindow::ALL.into_iter().map(|w| html! {
                          <option value={w.as_str()} selected={w == *window}>{ w.label() }</option>
                      })
                  }
              </select>
          </div>
          { error }
          { for server_counts }

          <div class="stats">
              { stat("Total tasks", stats.total_tasks.to_string()) }
              { stat("Completed", stats.completed_tasks.to_string()) }
              { stat("In progress", stats.in_progress_tasks.to_string()) }
              { stat("Pending", stats.pending_tasks.to_string()) }
              { stat("Completion rate", percent(stats.completion_rate)) }
              { stat("Subtasks done", format!("{}/{}", stats.completed_subtasks, stats.total_subtasks)) }
              { stat("Avg. completion", format!("{:.1} days", stats.avg_completion_days)) }
              { stat("Stagnant", stats.stagnant_tasks.to_string()) }
              <div class={band_class(stats.band())}>
                  <div class="stat-label">{ "Productivity" }</div>
                  <div class="stat-value">{ format!("{:.0}", stats.productivity_score) }</div>
              </div>
          </div>

          <section class="card">
              <div class="header">{ "Goals" }</div>
              <div>{ format!("This week: {}/{} ({})", dash.goals.weekly.completed, dash.goals.weekly.goal, percent(dash.goals.weekly.progress)) }</div>
              <div>{ format!("This month: {}/{} ({})", dash.goals.monthly.completed, dash.goals.monthly.goal, percent(dash.goals.monthly.progress)) }</div>
          </section>

          <section class="card">
              <div class="header">{ "Focus" }</div>
              {
                  for stats.focus_ratio.iter().map(|(name, share)| html! {
                      <div class="kv"><strong>{ name }</strong><span>{ percent(*share) }</span></div>
                  })
              }
          </section>

          <section class="card">
              <div class="header">{ "Categories" }</div>
              <table>
                  <tr><th>{ "Category" }</th><th>{ "Tasks" }</th><th>{ "Pending" }</th><th>{ "In progress" }</th><th>{ "Completed" }</th><th>{ "Rate" }</th></tr>
                  {
                      for dash.categories.iter().map(|c| html! {
                          <tr>
                              <td>{ &c.name }</td>
                              <td>{ c.count }</td>
                              <td>{ c.pending }</td>
                              <td>{ c.in_progress }</td>
                              <td>{ c.completed }</td>
                              <td>{ percent(c.completion_rate) }</td>
                          </tr>
                      })
                  }
              </table>
          </section>

          <section class="card">
              <div class="header">{ "Needs attention" }</div>
              {
                  if dash.needs_attention().is_empty() {
                      html! { <div class="muted">{ "Nothing is stagnant or overdue." }</div> }
                  } else {
                      html! {
                          <ul>
                              {
                                  for dash.needs_attention().into_iter().map(|e| html! {
                                      <li>
                                          <span class="badge">{ e.attention.label() }</span>
                                          { format!(" {} ({}, {} days old)", e.name, e.category, e.days_since_creation) }
                                      </li>
                                  })
                              }
                          </ul>
                      }
                  }
              }
          </section>

          <section class="card">
              <div class="header">{ "Timeline" }</div>
              {
                  for dash.timeline.iter().rev().take(TIMELINE_ROWS).map(|t| html! {
                      <div class="kv">
                          <strong>{ &t.name }</strong>
                          <span>{ format!("{} to {} ({} days, {})", format_day(t.start, &tz), format_day(t.end, &tz), t.duration_days, t.status) }</span>
                      </div>
                  })
              }
          </section>

          <section class="card">
              <div class="header">{ "Last 30 days" }</div>
              <div class="trend">
                  {
                      for dash.trend.iter().map(|day| html! {
                          <div
                              class="trend-bar"
                              title={format!("{}: {} created, {} completed", day.date, day.total, day.completed)}
                              style={format!("height:{:.0}%", day.productivity_score.max(2.0))}
                          />
                      })
                  }
              </div>
          </section>

          <section class="card">
              <div class="header">{ "Completion speed" }</div>
              <div>{ format!("Average: {:.1} days to start, {:.1} days to complete", dash.speed.avg_days_to_start, dash.speed.avg_days_to_complete) }</div>
              {
                  for dash.speed.fastest.iter().map(|e| html! {
                      <div>{ format!("Fastest: {} ({} days)", e.name, e.total_days) }</div>
                  })
              }
              {
                  for dash.speed.slowest.iter().map(|e| html! {
                      <div>{ format!("Slowest: {} ({} days)", e.name, e.total_days) }</div>
                  })
              }
          </section>
      </div>
  }
}
