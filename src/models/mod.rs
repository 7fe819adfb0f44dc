pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, Task, TaskAccess, UpdateTaskRequest};
pub use user::{User, UserResponse};
