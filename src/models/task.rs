use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Error message for a schedule whose end is not strictly after its start.
pub const INVALID_SCHEDULE: &str = "End date must be after start date";

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// Identifier of the user who created the task.
    pub user_id: Uuid,
    /// What needs doing.
    pub todo: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /tasks`. Every field is required.
///
/// Unknown fields such as `user_id` are ignored; the owner always comes from
/// the authenticated caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 1000, message = "todo must be between 1 and 1000 characters"))]
    pub todo: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Payload for `PUT /tasks/{id}`. Absent fields, and an empty `todo`, leave
/// the stored value untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 1000, message = "todo must be at most 1000 characters"))]
    pub todo: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a task owned by `user_id`, rejecting schedules that end before
    /// they start.
    pub fn new(input: CreateTaskRequest, user_id: Uuid) -> Result<Self, AppError> {
        ensure_schedule(input.start_date, input.end_date)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            todo: input.todo,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns a copy of this task with `changes` applied.
    ///
    /// The schedule is validated on the merged result, so a request carrying
    /// only an `end_date` is checked against the stored `start_date`.
    pub fn merged(&self, changes: UpdateTaskRequest) -> Result<Self, AppError> {
        let mut task = self.clone();

        if let Some(todo) = changes.todo.filter(|todo| !todo.is_empty()) {
            task.todo = todo;
        }
        if let Some(start_date) = changes.start_date {
            task.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            task.end_date = end_date;
        }

        ensure_schedule(task.start_date, task.end_date)?;
        task.updated_at = Utc::now();
        Ok(task)
    }
}

fn ensure_schedule(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<(), AppError> {
    if end_date <= start_date {
        return Err(AppError::BadRequest(INVALID_SCHEDULE.into()));
    }
    Ok(())
}

/// Who may read, change or delete a task once it exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskAccess {
    /// Any authenticated user may act on any task.
    #[default]
    Shared,
    /// Only the creator sees and modifies a task; others get 404.
    Owner,
}

impl TaskAccess {
    pub fn permits(&self, task: &Task, user_id: Uuid) -> bool {
        match self {
            TaskAccess::Shared => true,
            TaskAccess::Owner => task.user_id == user_id,
        }
    }
}

impl FromStr for TaskAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(TaskAccess::Shared),
            "owner" => Ok(TaskAccess::Owner),
            other => Err(format!("expected \"shared\" or \"owner\", got {:?}", other)),
        }
    }
}
