pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    /// Comma-separated allowed CORS origins. If empty or "*", mirrors any origin (dev mode).
    pub cors_origins: String,
    /// "development" or "production". Session cookies get the Secure flag in production.
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            cors_origins: std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    pub fn cookie_secure(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
