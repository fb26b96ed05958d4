use std::env;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub cache_ttl_secs: u64,
    pub upload_dir: String,
    pub frontend_base_url: String,
    pub payment_gateway_url: String,
    pub payment_gateway_secret: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub sms_api_url: String,
    pub sms_api_key: String,
}

impl AppConfig {
    /// Only DATABASE_URL and JWT_SECRET are mandatory; everything else has a
    /// development default.
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set in environment")?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set in environment")?;

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8080".to_string()),
            database_url,
            jwt_secret,
            cache_ttl_secs,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            frontend_base_url: env::var("FRONTEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            payment_gateway_secret: env::var("PAYMENT_GATEWAY_SECRET").unwrap_or_default(),
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "http://localhost:8025".to_string()),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@localdex.example".to_string()),
            sms_api_url: env::var("SMS_API_URL")
                .unwrap_or_else(|_| "http://localhost:8026".to_string()),
            sms_api_key: env::var("SMS_API_KEY").unwrap_or_default(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
