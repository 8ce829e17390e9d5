//! Headless dashboard layer for TaskMaster: a cookie-aware API client plus
//! the client state store (task list, composable filters, optimistic
//! reconciliation of mutation responses). UI code renders from
//! [`TaskStore`] snapshots and calls its methods on user actions.

pub mod api_client;
pub mod filter;
pub mod store;
pub mod types;

pub use api_client::ApiClient;
pub use filter::{PriorityFilter, StatusFilter, TaskFilters};
pub use store::TaskStore;
pub use types::{Priority, Task, TaskPayload, TaskStatus, User};
