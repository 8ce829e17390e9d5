mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;

#[cfg(test)]
mod tests;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub jwt_secret: String,
    /// Whether session cookies carry the Secure flag (production only).
    pub cookie_secure: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::register,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::me,
        routes::tasks::list_tasks,
        routes::tasks::create_task,
        routes::tasks::update_task,
        routes::tasks::toggle_complete,
        routes::tasks::delete_task,
        routes::tasks::reorder_tasks,
    ),
    components(schemas(
        models::user::RegisterRequest,
        models::user::LoginRequest,
        models::user::AuthResponse,
        models::user::MeResponse,
        models::user::MessageResponse,
        models::user::UserResponse,
        models::task::Task,
        models::task::TaskPayload,
        models::task::ReorderRequest,
        models::task::Priority,
        models::task::TaskStatus,
        error::ErrorBody,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login & session management"),
        (name = "Tasks", description = "Per-user task management")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            utoipa::openapi::security::SecurityScheme::ApiKey(
                utoipa::openapi::security::ApiKey::Cookie(
                    utoipa::openapi::security::ApiKeyValue::new(middleware::auth::SESSION_COOKIE),
                ),
            ),
        );
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskmaster_server=debug,tower_http=debug".into()),
        )
        .init();

    let config = config::Config::from_env();

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // The session cookie only round-trips cross-origin with credentials
    // allowed, which rules out wildcard origin/header values.
    let cors = if config.cors_origins.is_empty() || config.cors_origins == "*" {
        CorsLayer::very_permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    let state = AppState {
        db: pool,
        jwt_secret: config.jwt_secret.clone(),
        cookie_secure: config.cookie_secure(),
    };

    let app = routes::api_router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .unwrap();
    tracing::info!("Listening on {}", config.listen_addr);
    tracing::info!("Swagger UI at http://{}/docs/", config.listen_addr);
    axum::serve(listener, app).await.unwrap();
}
