use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub amei_base_url: String,
    pub amei_bearer_token: String,
    pub amei_cookie: String,
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub cache_backend: String,
    pub cache_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            amei_base_url: env::var("AMEI_BASE_URL")
                .unwrap_or_else(|_| "https://amei.amorsaude.com.br/api/v1".to_string()),
            amei_bearer_token: env::var("AMEI_BEARER_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("AMEI_BEARER_TOKEN not set, using empty value");
                    String::new()
                }),
            amei_cookie: env::var("AMEI_COOKIE").unwrap_or_else(|_| String::new()),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            cache_backend: env::var("CACHE_BACKEND").unwrap_or_else(|_| "file".to_string()),
            cache_dir: env::var("CACHE_DIR").unwrap_or_else(|_| "cache".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.amei_base_url.is_empty() && !self.amei_bearer_token.is_empty()
    }

    pub fn is_supabase_cache_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_role_key.is_empty()
    }
}
