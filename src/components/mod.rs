//! UI Components
//!
//! Leptos components of the taskboard views.

mod login_form;
mod project_form;
mod project_sidebar;
mod task_board;
mod task_form;

pub use login_form::LoginForm;
pub use project_form::ProjectForm;
pub use project_sidebar::ProjectSidebar;
pub use task_board::TaskBoard;
pub use task_form::TaskForm;
