use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub database_name: String,
    pub app_name: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            mongodb_uri: env::var("MONGODB_URI")
                .map_err(|_| anyhow::anyhow!("MONGODB_URI must be set"))?,
            database_name: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "ledger".to_string()),
            app_name: env::var("MONGODB_APP_NAME").unwrap_or_else(|_| "ledger-store".to_string()),
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default())?,
        })
    }
}

fn parse_log_format(raw: &str) -> anyhow::Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
    }
}
