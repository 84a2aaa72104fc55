pub mod dashboard;
pub mod datetime;
pub mod display;
pub mod endpoints;
pub mod forms;
pub mod pages;
pub mod store;
pub mod task;

pub use task::{
  AnalyticsSummary,
  Subtask,
  SubtaskCreate,
  SubtaskStatusUpdate,
  Task,
  TaskCreate,
  TaskStatus
};
