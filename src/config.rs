use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.figma.com/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Figma personal access token. Never persisted.
    pub access_token: Option<String>,
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub database_path: String,
    pub history_limit: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            access_token: env::var("FIGMA_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            api_base: env::var("FIGMA_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "figma_explorer.db".to_string()),
            history_limit: env::var("HISTORY_LIMIT")
                .ok()
                .and_then(|l| l.parse().ok())
                .unwrap_or(DEFAULT_HISTORY_LIMIT),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            access_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            database_path: "figma_explorer.db".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            cors_origins: vec!["*".to_string()],
        }
    }
}
