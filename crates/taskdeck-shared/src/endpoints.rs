use percent_encoding::{
  AsciiSet,
  CONTROLS,
  utf8_percent_encode
};
use serde::{
  Deserialize,
  Serialize
};

pub const DEFAULT_API_BASE: &str =
  "http://localhost:8000/api/v1";

// One path segment: slashes and
// percent signs must not leak through.
const SEGMENT_ENCODE_SET: &AsciiSet =
  &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub fn encode_segment(
  raw: &str
) -> String {
  utf8_percent_encode(
    raw,
    SEGMENT_ENCODE_SET
  )
  .to_string()
}

/// The two roots every request URL is
/// built from. Page-scoped routes hang
/// off `pages`, everything else off
/// `base`.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct ApiRoots {
  pub base:  String,
  pub pages: String
}

impl Default for ApiRoots {
  fn default() -> Self {
    Self::from_base(DEFAULT_API_BASE)
  }
}

impl ApiRoots {
  pub fn new(
    base: impl Into<String>,
    pages: impl Into<String>
  ) -> Self {
    Self {
      base:  trim_root(base.into()),
      pages: trim_root(pages.into())
    }
  }

  /// Pages root defaults to
  /// `<base>/pages`.
  pub fn from_base(
    base: impl Into<String>
  ) -> Self {
    let base = trim_root(base.into());
    let pages = format!("{base}/pages");
    Self {
      base,
      pages
    }
  }

  pub fn page_root(
    &self,
    page_name: &str
  ) -> String {
    format!(
      "{}/{}",
      self.pages,
      encode_segment(page_name)
    )
  }

  pub fn page_tasks(
    &self,
    page_name: &str
  ) -> String {
    format!(
      "{}/tasks",
      self.page_root(page_name)
    )
  }

  pub fn page_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> String {
    format!(
      "{}/tasks/{task_id}",
      self.page_root(page_name)
    )
  }

  pub fn start_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> String {
    format!(
      "{}/start",
      self.page_task(page_name, task_id)
    )
  }

  pub fn complete_task(
    &self,
    page_name: &str,
    task_id: u64
  ) -> String {
    format!(
      "{}/complete",
      self.page_task(page_name, task_id)
    )
  }

  pub fn all_tasks(&self) -> String {
    format!("{}/tasks/all", self.base)
  }

  pub fn analytics(&self) -> String {
    format!(
      "{}/tasks/analytics",
      self.base
    )
  }

  pub fn task_subtasks(
    &self,
    task_id: u64
  ) -> String {
    format!(
      "{}/tasks/{task_id}/subtasks",
      self.base
    )
  }

  pub fn subtask(
    &self,
    subtask_id: u64
  ) -> String {
    format!(
      "{}/subtasks/{subtask_id}",
      self.base
    )
  }

  pub fn subtask_status(
    &self,
    subtask_id: u64
  ) -> String {
    format!(
      "{}/status",
      self.subtask(subtask_id)
    )
  }
}

fn trim_root(raw: String) -> String {
  raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_and_global_routes_use_their_own_roots()
   {
    let roots = ApiRoots::new(
      "https://api.example.test/v1/",
      "https://pages.example.test/scoped"
    );

    assert_eq!(
      roots.page_tasks("Broker"),
      "https://pages.example.test/scoped/Broker/tasks"
    );
    assert_eq!(
      roots.all_tasks(),
      "https://api.example.test/v1/tasks/all"
    );
    assert_eq!(
      roots.subtask_status(7),
      "https://api.example.test/v1/subtasks/7/status"
    );
    assert_eq!(
      roots.complete_task("Broker", 3),
      "https://pages.example.test/scoped/Broker/tasks/3/complete"
    );
  }

  #[test]
  fn default_pages_root_sits_under_base() {
    let roots = ApiRoots::default();
    assert_eq!(
      roots.pages,
      "http://localhost:8000/api/v1/pages"
    );
    assert_eq!(
      roots.task_subtasks(2),
      "http://localhost:8000/api/v1/tasks/2/subtasks"
    );
  }

  #[test]
  fn page_names_are_a_single_encoded_segment() {
    let roots = ApiRoots::from_base("http://h");
    assert_eq!(
      roots.page_tasks("Machine Learning"),
      "http://h/pages/Machine%20Learning/tasks"
    );
    assert_eq!(
      roots.page_tasks("a/b"),
      "http://h/pages/a%2Fb/tasks"
    );
  }
}
