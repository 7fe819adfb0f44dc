use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::error::AppError;
use crate::models::{Task, User};

/// In-process store used by tests and local runs without PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already exists".into()));
        }
        if users.contains_key(&user.id) {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_tasks(&self, owner: Option<Uuid>) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        let mut listed: Vec<Task> = tasks
            .values()
            .filter(|task| owner.map_or(true, |user_id| task.user_id == user_id))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(listed)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn insert_task(&self, task: Task) -> Result<Task, AppError> {
        if !self.users.read().await.contains_key(&task.user_id) {
            return Err(AppError::DatabaseError(format!(
                "task owner {} does not exist",
                task.user_id
            )));
        }

        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn save_task(&self, task: Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(task)
            }
            None => Err(AppError::NotFound("Task not found".into())),
        }
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateTaskRequest;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn user(username: &str) -> User {
        User::new(username.into(), "hash".into(), "Name".into())
    }

    fn task_for(owner: Uuid, todo: &str) -> Task {
        let start = Utc::now();
        Task::new(
            CreateTaskRequest {
                todo: todo.into(),
                start_date: start,
                end_date: start + Duration::hours(1),
            },
            owner,
        )
        .unwrap()
    }

    #[actix_rt::test]
    async fn test_usernames_are_unique() {
        let store = MemoryStore::new();
        store.create_user(user("alice")).await.unwrap();

        let duplicate = store.create_user(user("alice")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let found = store.find_user_by_username("alice").await.unwrap();
        assert!(found.is_some());
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_task_lifecycle() {
        let store = MemoryStore::new();
        let alice = store.create_user(user("alice")).await.unwrap();

        let task = store.insert_task(task_for(alice.id, "first")).await.unwrap();
        assert_eq!(store.find_task(task.id).await.unwrap(), Some(task.clone()));

        let mut changed = task.clone();
        changed.todo = "changed".into();
        let saved = store.save_task(changed).await.unwrap();
        assert_eq!(saved.todo, "changed");
        assert_eq!(store.find_task(task.id).await.unwrap().unwrap().todo, "changed");

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(!store.delete_task(task.id).await.unwrap());
        assert_eq!(store.find_task(task.id).await.unwrap(), None);

        let gone = store.save_task(saved).await;
        assert!(matches!(gone, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_list_tasks_filters_by_owner() {
        let store = MemoryStore::new();
        let alice = store.create_user(user("alice")).await.unwrap();
        let bob = store.create_user(user("bob")).await.unwrap();

        let a = store.insert_task(task_for(alice.id, "a")).await.unwrap();
        let b = store.insert_task(task_for(bob.id, "b")).await.unwrap();

        let all = store.list_tasks(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let alices = store.list_tasks(Some(alice.id)).await.unwrap();
        assert_eq!(alices, vec![a]);
        let bobs = store.list_tasks(Some(bob.id)).await.unwrap();
        assert_eq!(bobs, vec![b]);
    }

    #[actix_rt::test]
    async fn test_task_requires_existing_owner() {
        let store = MemoryStore::new();
        let result = store.insert_task(task_for(Uuid::new_v4(), "orphan")).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}
