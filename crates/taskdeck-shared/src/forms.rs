use serde::{
  Deserialize,
  Serialize
};
use thiserror::Error;

use crate::task::{
  SubtaskCreate,
  TaskCreate
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
  #[error("task name is required")]
  MissingName,
  #[error("subtask title is required")]
  MissingSubtaskTitle,
  #[error("no subtask at position {0}")]
  NoSuchSubtask(usize)
}

fn non_blank(
  value: &str
) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct SubtaskDraft {
  pub title:       String,
  pub description: String
}

impl SubtaskDraft {
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>
  ) -> Self {
    Self {
      title:       title.into(),
      description: description.into()
    }
  }

  /// Parses the CLI shorthand
  /// `TITLE[::DESCRIPTION]`.
  pub fn from_spec(raw: &str) -> Self {
    match raw.split_once("::") {
      | Some((title, description)) => {
        Self::new(title, description)
      }
      | None => Self::new(raw, "")
    }
  }

  pub fn to_payload(
    &self
  ) -> Result<SubtaskCreate, FormError> {
    let title = non_blank(&self.title)
      .ok_or(FormError::MissingSubtaskTitle)?;
    Ok(SubtaskCreate {
      title,
      description: non_blank(
        &self.description
      )
    })
  }

  pub fn is_empty(&self) -> bool {
    self.title.trim().is_empty()
      && self.description.trim().is_empty()
  }

  pub fn clear(&mut self) {
    self.title.clear();
    self.description.clear();
  }
}

/// Task creation form state: the task
/// fields, subtasks added so far, and
/// the subtask currently being typed.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct TaskDraft {
  pub name:        String,
  pub description: String,
  pub subtasks:    Vec<SubtaskDraft>,
  pub pending:     SubtaskDraft
}

impl TaskDraft {
  pub fn new(
    name: impl Into<String>,
    description: impl Into<String>
  ) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      ..Self::default()
    }
  }

  pub fn add_subtask(
    &mut self
  ) -> Result<(), FormError> {
    if self.pending.title.trim().is_empty()
    {
      return Err(
        FormError::MissingSubtaskTitle
      );
    }
    let draft =
      std::mem::take(&mut self.pending);
    self.subtasks.push(draft);
    Ok(())
  }

  pub fn remove_subtask(
    &mut self,
    index: usize
  ) -> Result<SubtaskDraft, FormError> {
    if index >= self.subtasks.len() {
      return Err(FormError::NoSuchSubtask(
        index
      ));
    }
    Ok(self.subtasks.remove(index))
  }

  pub fn to_payload(
    &self
  ) -> Result<TaskCreate, FormError> {
    let name = non_blank(&self.name)
      .ok_or(FormError::MissingName)?;
    let subtasks = self
      .subtasks
      .iter()
      .map(SubtaskDraft::to_payload)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskCreate {
      name,
      description: non_blank(
        &self.description
      ),
      subtasks
    })
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }
}
