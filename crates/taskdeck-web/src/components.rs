mod add_subtask_form;
mod dashboard;
mod error_banner;
mod sidebar;
mod subtask_item;
mod task_form;
mod task_item;
mod task_list;
mod task_page;

pub use add_subtask_form::AddSubtaskForm;
pub use dashboard::DashboardView;
pub use error_banner::ErrorBanner;
pub use sidebar::Sidebar;
pub use subtask_item::SubtaskItem;
pub use task_form::TaskForm;
pub use task_item::TaskItem;
pub use task_list::{
  TaskCallbacks,
  TaskList
};
pub use task_page::TaskPage;
