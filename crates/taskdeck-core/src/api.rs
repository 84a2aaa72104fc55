use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{
  Client,
  RequestBuilder
};
use serde::de::DeserializeOwned;
use taskdeck_shared::endpoints::ApiRoots;
use taskdeck_shared::task::{
  AnalyticsSummary,
  Subtask,
  SubtaskCreate,
  SubtaskStatusUpdate,
  Task,
  TaskCreate,
  TaskStatus
};
use thiserror::Error;
use tracing::{
  debug,
  instrument
};

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("request to {url} failed")]
  Transport {
    url:    String,
    #[source]
    source: reqwest::Error
  },
  #[error("HTTP error! status: {status}")]
  Status {
    status: u16,
    url:    String
  },
  #[error("failed to decode response from {url}")]
  Decode {
    url:    String,
    #[source]
    source: reqwest::Error
  }
}

impl ApiError {
  pub fn status(&self) -> Option<u16> {
    match self {
      | ApiError::Status {
        status,
        ..
      } => Some(*status),
      | _ => None
    }
  }
}

/// The backend operations the task
/// manager drives. Page-scoped calls
/// take the page name.
pub trait TaskBackend {
  fn list_page_tasks(
    &self,
    page_name: &str
  ) -> Result<Vec<Task>, ApiError>;

  fn list_all_tasks(
    &self
  ) -> Result<Vec<Task>, ApiError>;

  fn create_task(
    &self,
    page_name: &str,
    payload: &TaskCreate
  ) -> Result<Task, ApiError>;

  fn start_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> Result<Task, ApiError>;

  fn complete_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> Result<Task, ApiError>;

  fn delete_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> Result<(), ApiError>;

  fn add_subtask(
    &self,
    task_id: u64,
    payload: &SubtaskCreate
  ) -> Result<Subtask, ApiError>;

  fn update_subtask_status(
    &self,
    subtask_id: u64,
    status: TaskStatus
  ) -> Result<Subtask, ApiError>;

  fn delete_subtask(
    &self,
    subtask_id: u64
  ) -> Result<(), ApiError>;

  fn analytics(
    &self
  ) -> Result<AnalyticsSummary, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
  client: Client,
  roots:  ApiRoots
}

impl ApiClient {
  pub fn new(
    roots: ApiRoots,
    timeout: Duration
  ) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context(
        "failed building HTTP client \
         for the task API"
      )?;
    debug!(
      base = %roots.base,
      pages = %roots.pages,
      timeout_secs = timeout.as_secs(),
      "api client ready"
    );
    Ok(Self {
      client,
      roots
    })
  }

  pub fn roots(&self) -> &ApiRoots {
    &self.roots
  }

  fn send(
    &self,
    url: &str,
    request: RequestBuilder
  ) -> Result<reqwest::blocking::Response, ApiError>
  {
    let response =
      request.send().map_err(|source| {
        ApiError::Transport {
          url: url.to_string(),
          source
        }
      })?;

    let status = response.status();
    debug!(
      url,
      status = status.as_u16(),
      "api response"
    );
    if !status.is_success() {
      return Err(ApiError::Status {
        status: status.as_u16(),
        url:    url.to_string()
      });
    }
    Ok(response)
  }

  fn send_json<T>(
    &self,
    url: &str,
    request: RequestBuilder
  ) -> Result<T, ApiError>
  where
    T: DeserializeOwned
  {
    self
      .send(url, request)?
      .json::<T>()
      .map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source
      })
  }
}

impl TaskBackend for ApiClient {
  #[instrument(skip(self))]
  fn list_page_tasks(
    &self,
    page_name: &str
  ) -> Result<Vec<Task>, ApiError> {
    let url =
      self.roots.page_tasks(page_name);
    self.send_json(&url, self.client.get(&url))
  }

  #[instrument(skip(self))]
  fn list_all_tasks(
    &self
  ) -> Result<Vec<Task>, ApiError> {
    let url = self.roots.all_tasks();
    self.send_json(&url, self.client.get(&url))
  }

  #[instrument(skip(self, payload), fields(name = %payload.name))]
  fn create_task(
    &self,
    page_name: &str,
    payload: &TaskCreate
  ) -> Result<Task, ApiError> {
    let url =
      self.roots.page_tasks(page_name);
    self.send_json(
      &url,
      self.client.post(&url).json(payload)
    )
  }

  #[instrument(skip(self))]
  fn start_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> Result<Task, ApiError> {
    let url = self
      .roots
      .start_task(page_name, task_id);
    self.send_json(&url, self.client.put(&url))
  }

  #[instrument(skip(self))]
  fn complete_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> Result<Task, ApiError> {
    let url = self
      .roots
      .complete_task(page_name, task_id);
    self.send_json(&url, self.client.put(&url))
  }

  #[instrument(skip(self))]
  fn delete_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> Result<(), ApiError> {
    let url = self
      .roots
      .page_task(page_name, task_id);
    self
      .send(&url, self.client.delete(&url))
      .map(|_| ())
  }

  #[instrument(skip(self, payload), fields(title = %payload.title))]
  fn add_subtask(
    &self,
    task_id: u64,
    payload: &SubtaskCreate
  ) -> Result<Subtask, ApiError> {
    let url =
      self.roots.task_subtasks(task_id);
    self.send_json(
      &url,
      self.client.post(&url).json(payload)
    )
  }

  #[instrument(skip(self))]
  fn update_subtask_status(
    &self,
    subtask_id: u64,
    status: TaskStatus
  ) -> Result<Subtask, ApiError> {
    let url =
      self.roots.subtask_status(subtask_id);
    self.send_json(
      &url,
      self
        .client
        .put(&url)
        .json(&SubtaskStatusUpdate {
          status
        })
    )
  }

  #[instrument(skip(self))]
  fn delete_subtask(
    &self,
    subtask_id: u64
  ) -> Result<(), ApiError> {
    let url = self.roots.subtask(subtask_id);
    self
      .send(&url, self.client.delete(&url))
      .map(|_| ())
  }

  #[instrument(skip(self))]
  fn analytics(
    &self
  ) -> Result<AnalyticsSummary, ApiError> {
    let url = self.roots.analytics();
    self.send_json(&url, self.client.get(&url))
  }
}
