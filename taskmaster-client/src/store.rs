use tokio::sync::RwLock;

use crate::api_client::ApiClient;
use crate::filter::{PriorityFilter, StatusFilter, TaskFilters};
use crate::types::{Task, TaskPayload, User};

/// Client-side state for the dashboard: the authoritative task list as last
/// reconciled with the server, the active filters, and the derived filtered
/// view. Mutations patch the local list from the server's response instead
/// of refetching; a reconciliation miss (unknown id, i.e. local drift) falls
/// back to a full refetch.
pub struct TaskStore {
    api: ApiClient,
    user: RwLock<Option<User>>,
    tasks: RwLock<Vec<Task>>,
    filters: RwLock<TaskFilters>,
    /// Rebuilt whenever the list or a filter changes. Drag reorder touches
    /// only this, never the authoritative list.
    view: RwLock<Vec<Task>>,
}

impl TaskStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            api: ApiClient::new(base_url),
            user: RwLock::new(None),
            tasks: RwLock::new(Vec::new()),
            filters: RwLock::new(TaskFilters::default()),
            view: RwLock::new(Vec::new()),
        }
    }

    // ── Auth ────────────────────────────────────────────────────────────

    /// Fetching the task list is a separate `refresh` call, made when the
    /// dashboard mounts.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<User, String> {
        let user = self.api.register(name, email, phone, password).await?;
        log::info!("registered as {}", user.email);
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, String> {
        let user = self.api.login(email, password).await?;
        log::info!("logged in as {}", user.email);
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    /// Re-establish the session from an existing cookie, as the dashboard
    /// does on load before showing anything.
    pub async fn restore_session(&self) -> Result<User, String> {
        let user = self.api.current_user().await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), String> {
        self.api.logout().await?;
        log::info!("logged out");
        *self.user.write().await = None;
        self.tasks.write().await.clear();
        self.view.write().await.clear();
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.user.read().await.is_some()
    }

    // ── Tasks ───────────────────────────────────────────────────────────

    /// Replace the authoritative list with the server's and rebuild the view.
    pub async fn refresh(&self) -> Result<(), String> {
        let tasks = self.api.fetch_tasks().await?;
        *self.tasks.write().await = tasks;
        self.rebuild_view().await;
        Ok(())
    }

    pub async fn add_task(&self, payload: &TaskPayload) -> Result<Task, String> {
        let task = self.api.create_task(payload).await?;
        self.tasks.write().await.push(task.clone());
        self.rebuild_view().await;
        Ok(task)
    }

    pub async fn update_task(&self, id: i64, payload: &TaskPayload) -> Result<Task, String> {
        let task = self.api.update_task(id, payload).await?;
        if self.apply_replace(task.clone()).await {
            self.rebuild_view().await;
        } else {
            self.refresh().await?;
        }
        Ok(task)
    }

    pub async fn toggle_complete(&self, id: i64) -> Result<Task, String> {
        let task = self.api.toggle_complete(id).await?;
        if self.apply_replace(task.clone()).await {
            self.rebuild_view().await;
        } else {
            self.refresh().await?;
        }
        Ok(task)
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), String> {
        self.api.delete_task(id).await?;
        if self.apply_remove(id).await {
            self.rebuild_view().await;
        } else {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Optimistically splice the view, then try to persist. On failure the
    /// view is rebuilt from the authoritative list and the error surfaces to
    /// the caller.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<(), String> {
        let task_id = {
            let mut view = self.view.write().await;
            if from >= view.len() || to >= view.len() {
                log::warn!("reorder out of range: {} -> {} of {}", from, to, view.len());
                return Ok(());
            }
            let task = view.remove(from);
            let task_id = task.id;
            view.insert(to, task);
            task_id
        };

        if let Err(e) = self.api.reorder_task(task_id, to as i64).await {
            self.rebuild_view().await;
            return Err(e);
        }
        Ok(())
    }

    // ── Filters ─────────────────────────────────────────────────────────

    pub async fn set_search(&self, query: &str) {
        self.filters.write().await.search = query.to_string();
        self.rebuild_view().await;
    }

    pub async fn set_status_filter(&self, status: StatusFilter) {
        self.filters.write().await.status = status;
        self.rebuild_view().await;
    }

    pub async fn set_priority_filter(&self, priority: PriorityFilter) {
        self.filters.write().await.priority = priority;
        self.rebuild_view().await;
    }

    pub async fn clear_filters(&self) {
        *self.filters.write().await = TaskFilters::default();
        self.rebuild_view().await;
    }

    pub async fn filters(&self) -> TaskFilters {
        self.filters.read().await.clone()
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    pub async fn view(&self) -> Vec<Task> {
        self.view.read().await.clone()
    }

    // ── Reconciliation ──────────────────────────────────────────────────

    /// Replace the task with the same id in the authoritative list. False
    /// means the id is unknown locally and the caller should refetch.
    async fn apply_replace(&self, task: Task) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task;
                true
            }
            None => false,
        }
    }

    async fn apply_remove(&self, id: i64) -> bool {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        tasks.len() != before
    }

    async fn rebuild_view(&self) {
        let tasks = self.tasks.read().await;
        let filters = self.filters.read().await;
        let view = filters.apply(&tasks, chrono::Utc::now());
        drop(filters);
        drop(tasks);
        *self.view.write().await = view;
    }
}
