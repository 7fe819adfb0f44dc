//! Persistence for users and tasks.
//!
//! Handlers talk to the [`Store`] trait only. [`PgStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process and backs the test
//! suite. Neither adds locking around read-modify-write sequences: two
//! concurrent updates of one task resolve as last writer wins.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a new user. Fails with `AppError::Conflict` when the username
    /// is already taken.
    async fn create_user(&self, user: User) -> Result<User, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Lists tasks ordered by creation time, optionally restricted to one owner.
    async fn list_tasks(&self, owner: Option<Uuid>) -> Result<Vec<Task>, AppError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn insert_task(&self, task: Task) -> Result<Task, AppError>;

    /// Overwrites the stored task with the same id. Fails with
    /// `AppError::NotFound` if it was deleted in the meantime.
    async fn save_task(&self, task: Task) -> Result<Task, AppError>;

    /// Removes a task, returning whether anything was deleted.
    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError>;
}
