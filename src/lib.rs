pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod store;
pub mod util;

pub use model::{Comment, Priority, SortKey, StatusFilter, SubTask, Task, TaskDraft, ViewParams};
pub use store::{StoreError, TaskStore};
