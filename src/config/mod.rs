use std::env;

/// Application configuration, constructed once at startup and passed through
/// `AppState`. Business logic never reads the environment directly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base directory for presigned file uploads (default: "./uploads")
    pub upload_base_dir: String,

    /// HMAC secret for presigned upload/download tokens
    pub file_upload_secret: String,

    /// Secret for signing admin session JWTs
    pub jwt_secret: String,

    /// Public base URL used to build absolute presigned links
    pub public_base_url: String,

    /// TTL for upload and download tokens in seconds (default: 300)
    pub token_ttl_secs: i64,

    /// Maximum upload size in bytes (default: 10 MiB)
    pub max_upload_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_base_dir: "./uploads".to_string(),
            file_upload_secret: "dev-upload-secret".to_string(),
            jwt_secret: "secret".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            token_ttl_secs: 300,
            max_upload_size: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_base_dir: env::var("FILE_UPLOAD_BASE_DIR").unwrap_or(default.upload_base_dir),

            file_upload_secret: env::var("FILE_UPLOAD_SECRET")
                .unwrap_or(default.file_upload_secret),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),

            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.token_ttl_secs),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),
        }
    }

    /// Create config for development (relaxed defaults, local uploads dir)
    pub fn development() -> Self {
        Self::default()
    }

    /// Create config for production (secrets must be provided)
    pub fn production() -> Self {
        let default = Self::default();
        Self {
            upload_base_dir: env::var("FILE_UPLOAD_BASE_DIR").unwrap_or(default.upload_base_dir),
            file_upload_secret: env::var("FILE_UPLOAD_SECRET")
                .expect("CRITICAL: FILE_UPLOAD_SECRET must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),
            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.token_ttl_secs),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.token_ttl_secs, 300);
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.upload_base_dir, "./uploads");
        assert_eq!(config.public_base_url, "http://localhost:3000");
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        unsafe { env::remove_var("TOKEN_TTL_SECS") };
        unsafe { env::remove_var("MAX_UPLOAD_SIZE") };
        let config = AppConfig::from_env();
        assert_eq!(config.token_ttl_secs, AppConfig::default().token_ttl_secs);
        assert_eq!(config.max_upload_size, AppConfig::default().max_upload_size);
    }
}
