use chrono_tz::Tz;
use gloo::net::http::{
  Request,
  RequestBuilder,
  Response
};
use serde::{
  Serialize,
  de::DeserializeOwned
};
use taskdeck_shared::endpoints::{
  ApiRoots,
  DEFAULT_API_BASE
};
use taskdeck_shared::task::{
  AnalyticsSummary,
  Subtask,
  SubtaskCreate,
  SubtaskStatusUpdate,
  Task,
  TaskCreate,
  TaskStatus
};

/// Roots baked in at build time:
/// `TASKDECK_API_URL`, and optionally
/// `TASKDECK_PAGES_URL`.
pub fn configured_roots() -> ApiRoots {
  let base = option_env!("TASKDECK_API_URL")
    .unwrap_or(DEFAULT_API_BASE);
  match option_env!("TASKDECK_PAGES_URL") {
    | Some(pages) => ApiRoots::new(base, pages),
    | None => ApiRoots::from_base(base)
  }
}

/// The browser's zone, UTC when it is
/// unknown to chrono-tz.
pub fn browser_timezone() -> Tz {
  let format = js_sys::Intl::DateTimeFormat::new(
    &js_sys::Array::new(),
    &js_sys::Object::new()
  );
  let zone = js_sys::Reflect::get(
    &format.resolved_options(),
    &"timeZone".into()
  )
  .ok()
  .and_then(|value| value.as_string());

  match zone.as_deref().map(str::parse::<Tz>) {
    | Some(Ok(tz)) => tz,
    | other => {
      tracing::debug!(
        zone = ?zone,
        parsed = other.is_some(),
        "falling back to UTC"
      );
      Tz::UTC
    }
  }
}

fn checked(
  url: &str,
  response: Response
) -> Result<Response, String> {
  tracing::debug!(
    url,
    status = response.status(),
    "api response"
  );
  if !response.ok() {
    return Err(format!(
      "HTTP error! status: {}",
      response.status()
    ));
  }
  Ok(response)
}

async fn send(
  url: &str,
  request: RequestBuilder
) -> Result<Response, String> {
  let response = request
    .send()
    .await
    .map_err(|e| format!("request to {url} failed: {e}"))?;
  checked(url, response)
}

async fn send_json<R>(
  url: &str,
  request: RequestBuilder
) -> Result<R, String>
where
  R: DeserializeOwned
{
  send(url, request)
    .await?
    .json::<R>()
    .await
    .map_err(|e| format!("decode error: {e}"))
}

async fn send_body<R, B>(
  url: &str,
  request: RequestBuilder,
  body: &B
) -> Result<R, String>
where
  R: DeserializeOwned,
  B: Serialize + ?Sized
{
  let request = request
    .json(body)
    .map_err(|e| format!("failed to encode body: {e}"))?;
  let response = request
    .send()
    .await
    .map_err(|e| format!("request to {url} failed: {e}"))?;
  checked(url, response)?
    .json::<R>()
    .await
    .map_err(|e| format!("decode error: {e}"))
}

pub async fn list_page_tasks(
  roots: &ApiRoots,
  page_name: &str
) -> Result<Vec<Task>, String> {
  let url = roots.page_tasks(page_name);
  send_json(&url, Request::get(&url)).await
}

pub async fn list_all_tasks(
  roots: &ApiRoots
) -> Result<Vec<Task>, String> {
  let url = roots.all_tasks();
  send_json(&url, Request::get(&url)).await
}

pub async fn create_task(
  roots: &ApiRoots,
  page_name: &str,
  payload: &TaskCreate
) -> Result<Task, String> {
  let url = roots.page_tasks(page_name);
  send_body(&url, Request::post(&url), payload)
    .await
}

pub async fn start_task(
  roots: &ApiRoots,
  page_name: &str,
  task_id: u64
) -> Result<Task, String> {
  let url =
    roots.start_task(page_name, task_id);
  send_json(&url, Request::put(&url)).await
}

pub async fn complete_task(
  roots: &ApiRoots,
  page_name: &str,
  task_id: u64
) -> Result<Task, String> {
  let url =
    roots.complete_task(page_name, task_id);
  send_json(&url, Request::put(&url)).await
}

pub async fn delete_task(
  roots: &ApiRoots,
  page_name: &str,
  task_id: u64
) -> Result<(), String> {
  let url = roots.page_task(page_name, task_id);
  send(&url, Request::delete(&url))
    .await
    .map(|_| ())
}

pub async fn add_subtask(
  roots: &ApiRoots,
  task_id: u64,
  payload: &SubtaskCreate
) -> Result<Subtask, String> {
  let url = roots.task_subtasks(task_id);
  send_body(&url, Request::post(&url), payload)
    .await
}

pub async fn update_subtask_status(
  roots: &ApiRoots,
  subtask_id: u64,
  status: TaskStatus
) -> Result<Subtask, String> {
  let url = roots.subtask_status(subtask_id);
  send_body(
    &url,
    Request::put(&url),
    &SubtaskStatusUpdate {
      status
    }
  )
  .await
}

pub async fn delete_subtask(
  roots: &ApiRoots,
  subtask_id: u64
) -> Result<(), String> {
  let url = roots.subtask(subtask_id);
  send(&url, Request::delete(&url))
    .await
    .map(|_| ())
}

pub async fn analytics(
  roots: &ApiRoots
) -> Result<AnalyticsSummary, String> {
  let url = roots.analytics();
  send_json(&url, Request::get(&url)).await
}
