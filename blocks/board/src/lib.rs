//! View-side logic for the task board: the live task list, the mutation
//! gateway, and the dashboard and task detail views built on them.

pub mod confirm;
pub mod dashboard;
pub mod detail;
pub mod gateway;
pub mod live_list;
pub mod share;

#[cfg(test)]
pub(crate) mod testing;

pub use confirm::DeleteConfirmation;
pub use dashboard::{Dashboard, SubmitOutcome, TaskForm};
pub use detail::{TaskDetail, TaskView};
pub use gateway::{ListReconciliationPolicy, MutationGateway};
pub use live_list::{ListState, LiveListSynchronizer};
pub use share::{Clipboard, ShareError, ShareLinks, COPY_INDICATOR_DELAY};
