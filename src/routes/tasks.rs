use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, Task, TaskAccess, UpdateTaskRequest},
    store::Store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Response body for `GET /tasks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

/// Response body for a successful delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Loads a task the caller is allowed to see under the configured policy.
///
/// A task hidden by the policy is reported exactly like a missing one.
async fn fetch_task(
    store: &dyn Store,
    access: TaskAccess,
    caller: &AuthenticatedUser,
    id: Uuid,
) -> Result<Task, AppError> {
    store
        .find_task(id)
        .await?
        .filter(|task| access.permits(task, caller.0.id))
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Lists tasks.
///
/// Under the `shared` policy this returns every task in the store. Under
/// `owner` only the caller's tasks are returned. Tasks are ordered by
/// creation time.
///
/// ## Responses:
/// - `200 OK`: `{"tasks": [...]}`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn get_tasks(
    store: web::Data<dyn Store>,
    access: web::Data<TaskAccess>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let owner = match access.get_ref() {
        TaskAccess::Shared => None,
        TaskAccess::Owner => Some(caller.0.id),
    };
    let tasks = store.list_tasks(owner).await?;

    Ok(HttpResponse::Ok().json(TaskList { tasks }))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// `{"todo": String, "start_date": RFC 3339, "end_date": RFC 3339}`, all required.
/// Any owner field in the body is ignored.
///
/// ## Responses:
/// - `201 Created`: Returns the new `Task`.
/// - `400 Bad Request`: Missing or malformed fields, empty `todo`, or
///   `end_date` not strictly after `start_date`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    caller: AuthenticatedUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), caller.0.id)?;
    let task = store.insert_task(task).await?;
    log::debug!("User {} created task {}", caller.0.id, task.id);

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task`.
/// - `400 Bad Request`: If `id` is not a valid UUID.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: No such task, or hidden by the `owner` policy.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    access: web::Data<TaskAccess>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(store.get_ref(), **access, &caller, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates an existing task.
///
/// Only the fields present in the body (and a non-empty `todo`) replace the
/// stored values. The end-after-start rule is checked on the merged task.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task`.
/// - `400 Bad Request`: Bad UUID, malformed body, or an invalid merged schedule.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: No such task, or hidden by the `owner` policy.
#[put("/{id}")]
pub async fn update_task(
    store: web::Data<dyn Store>,
    access: web::Data<TaskAccess>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let existing = fetch_task(store.get_ref(), **access, &caller, task_id.into_inner()).await?;
    let updated = existing.merged(task_data.into_inner())?;
    let saved = store.save_task(updated).await?;

    Ok(HttpResponse::Ok().json(saved))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Task deleted successfully"}`.
/// - `400 Bad Request`: If `id` is not a valid UUID.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: No such task, or hidden by the `owner` policy.
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    access: web::Data<TaskAccess>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(store.get_ref(), **access, &caller, task_id.into_inner()).await?;

    if !store.delete_task(task.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    log::debug!("User {} deleted task {}", caller.0.id, task.id);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Task deleted successfully".into(),
    }))
}
