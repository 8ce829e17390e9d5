use reqwest::Client;

use crate::types::*;

/// Thin HTTP wrapper around the TaskMaster API. Errors are user-facing
/// strings: the server's `message` when it sent one, otherwise a fixed
/// per-action fallback.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        // The cookie store carries the http-only session cookie across calls,
        // so auth happens transparently after login/register.
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Auth ────────────────────────────────────────────────────────────

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<User, String> {
        let resp = self
            .client
            .post(format!("{}/api/auth/register", self.base_url))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "phone": phone,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| request_failed("register", e, "Registration failed"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Registration failed"));
        }

        resp.json::<AuthResponse>()
            .await
            .map(|r| r.user)
            .map_err(|e| request_failed("register response", e, "Registration failed"))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, String> {
        let resp = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| request_failed("login", e, "Login failed"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Login failed"));
        }

        resp.json::<AuthResponse>()
            .await
            .map(|r| r.user)
            .map_err(|e| request_failed("login response", e, "Login failed"))
    }

    pub async fn logout(&self) -> Result<(), String> {
        let resp = self
            .client
            .post(format!("{}/api/auth/logout", self.base_url))
            .send()
            .await
            .map_err(|e| request_failed("logout", e, "Logout failed"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Logout failed"));
        }

        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, String> {
        let resp = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .send()
            .await
            .map_err(|e| request_failed("current_user", e, "Failed to fetch user"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to fetch user"));
        }

        resp.json::<MeResponse>()
            .await
            .map(|r| r.user)
            .map_err(|e| request_failed("current_user response", e, "Failed to fetch user"))
    }

    // ── Tasks ───────────────────────────────────────────────────────────

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, String> {
        let resp = self
            .client
            .get(format!("{}/api/tasks", self.base_url))
            .send()
            .await
            .map_err(|e| request_failed("fetch_tasks", e, "Failed to fetch tasks"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to fetch tasks"));
        }

        resp.json::<Vec<Task>>()
            .await
            .map_err(|e| request_failed("fetch_tasks response", e, "Failed to fetch tasks"))
    }

    pub async fn create_task(&self, payload: &TaskPayload) -> Result<Task, String> {
        let resp = self
            .client
            .post(format!("{}/api/tasks", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(|e| request_failed("create_task", e, "Failed to add task"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to add task"));
        }

        resp.json::<Task>()
            .await
            .map_err(|e| request_failed("create_task response", e, "Failed to add task"))
    }

    pub async fn update_task(&self, id: i64, payload: &TaskPayload) -> Result<Task, String> {
        let resp = self
            .client
            .put(format!("{}/api/tasks/{}", self.base_url, id))
            .json(payload)
            .send()
            .await
            .map_err(|e| request_failed("update_task", e, "Failed to update task"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to update task"));
        }

        resp.json::<Task>()
            .await
            .map_err(|e| request_failed("update_task response", e, "Failed to update task"))
    }

    pub async fn toggle_complete(&self, id: i64) -> Result<Task, String> {
        let resp = self
            .client
            .patch(format!("{}/api/tasks/{}/complete", self.base_url, id))
            .send()
            .await
            .map_err(|e| request_failed("toggle_complete", e, "Failed to complete task"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to complete task"));
        }

        resp.json::<Task>()
            .await
            .map_err(|e| request_failed("toggle_complete response", e, "Failed to complete task"))
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), String> {
        let resp = self
            .client
            .delete(format!("{}/api/tasks/{}", self.base_url, id))
            .send()
            .await
            .map_err(|e| request_failed("delete_task", e, "Failed to delete task"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to delete task"));
        }

        Ok(())
    }

    /// Best-effort persistence for drag reorder. The server acknowledges and
    /// discards it; kept so the store's optimistic flow matches the API.
    pub async fn reorder_task(&self, task_id: i64, new_position: i64) -> Result<(), String> {
        let resp = self
            .client
            .post(format!("{}/api/tasks/reorder", self.base_url))
            .json(&ReorderRequest {
                task_id,
                new_position,
            })
            .send()
            .await
            .map_err(|e| request_failed("reorder_task", e, "Failed to reorder tasks"))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(extract_error(&body, "Failed to reorder tasks"));
        }

        Ok(())
    }
}

fn request_failed(action: &str, err: reqwest::Error, fallback: &str) -> String {
    log::warn!("{}: {}", action, err);
    fallback.to_string()
}

/// Pull the server's `message` out of an error body, falling back to the
/// per-action string when the body is not the expected JSON shape.
fn extract_error(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| fallback.to_string())
}
