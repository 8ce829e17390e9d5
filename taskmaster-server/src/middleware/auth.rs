use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::error::ApiError;
use crate::models::user::{Claims, UserResponse};
use crate::AppState;

/// Name of the http-only session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Sessions are valid for a fixed 7 days; the cookie max-age matches.
const SESSION_TTL_SECS: usize = 7 * 24 * 3600;

/// Extractor for authenticated requests. Resolves the session cookie to the
/// owning user's public fields.
pub struct AuthUser(pub UserResponse);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let token_data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::Forbidden("Invalid or expired token".to_string()))?;

        // Tokens are stateless, so re-check that the user still exists: a
        // deleted account invalidates its outstanding sessions.
        let user =
            sqlx::query_as::<_, UserResponse>("SELECT id, name, email FROM users WHERE id = ?")
                .bind(token_data.claims.sub)
                .fetch_optional(&state.db)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser(user))
    }
}

pub fn create_token(user_id: i64, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        exp: now + SESSION_TTL_SECS,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Build the session cookie set on successful register/login. `secure` is
/// driven by configuration: off for local development, on in production.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(7))
        .build()
}

/// Cookie with the same name/path as `session_cookie`, handed to
/// `CookieJar::remove` so browsers actually drop the session.
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
