pub mod auth;
pub mod tasks;

use crate::AppState;
use axum::Router;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/tasks", tasks::router())
        .with_state(state)
}
