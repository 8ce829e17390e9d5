use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;

use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::{ApiError, ErrorBody};
use crate::middleware::auth::{create_token, session_cookie, session_cookie_removal, AuthUser};
use crate::models::user::{
    AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest, UserResponse,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, session cookie set", body = AuthResponse),
        (status = 400, description = "Missing fields or email/phone already in use", body = ErrorBody),
    ),
    tag = "Auth"
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let (name, email, phone, password) = match (req.name, req.email, req.phone, req.password) {
        (Some(name), Some(email), Some(phone), Some(password))
            if !name.is_empty()
                && !email.is_empty()
                && !phone.is_empty()
                && !password.is_empty() =>
        {
            (name, email, phone, password)
        }
        _ => return Err(ApiError::Validation("All fields are required".to_string())),
    };

    // Email is checked before phone so a request that collides on both
    // reports the email conflict.
    let email_taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if email_taken.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let phone_taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE phone = ?")
        .bind(&phone)
        .fetch_optional(&state.db)
        .await?;
    if phone_taken.is_some() {
        return Err(ApiError::Conflict("Phone number already in use".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?
        .to_string();

    let user = sqlx::query_as::<_, UserResponse>(
        "INSERT INTO users (name, email, phone, password_hash, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, name, email",
    )
    .bind(&name)
    .bind(&email)
    .bind(&phone)
    .bind(&password_hash)
    .bind(chrono::Utc::now())
    .fetch_one(&state.db)
    .await?;

    let token = create_token(user.id, &state.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;
    let jar = jar.add(session_cookie(token, state.cookie_secure));

    tracing::info!(user_id = user.id, "registered new user");

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ErrorBody),
    ),
    tag = "Auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let (email, password) = match (req.email, req.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ))
        }
    };

    // Unknown email and wrong password answer identically so the endpoint
    // cannot be used to enumerate accounts.
    let (id, name, email, password_hash) = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, email, password_hash FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&password_hash)
        .map_err(|e| ApiError::Internal(format!("stored password hash unreadable: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let token = create_token(id, &state.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;
    let jar = jar.add(session_cookie(token, state.cookie_secure));

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: UserResponse { id, name, email },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse),
    ),
    tag = "Auth"
)]
pub(crate) async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(session_cookie_removal()),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated user", body = MeResponse),
        (status = 401, description = "No session or user no longer exists", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub(crate) async fn me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}
