//! Environment-driven application configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::gemini;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub db_path: PathBuf,
    pub admin_token: String,
    /// Absent key is tolerated at startup and reported per request, so menu
    /// browsing keeps working without it.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_connect_timeout: Duration,
    pub gemini_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let admin_token =
            env::var("ADMIN_TOKEN").context("ADMIN_TOKEN environment variable not set")?;

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            upload_dir: env::var("MENU_UPLOAD_DIR")
                .unwrap_or_else(|_| "menu_files".to_string())
                .into(),
            db_path: env::var("MENU_DB_PATH")
                .unwrap_or_else(|_| "menu.db".to_string())
                .into(),
            admin_token,
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| gemini::DEFAULT_API_URL.to_string()),
            gemini_connect_timeout: duration_from_env("GEMINI_CONNECT_TIMEOUT_SECS", 10)?,
            gemini_timeout: duration_from_env("GEMINI_TIMEOUT_SECS", 30)?,
        })
    }
}

fn duration_from_env(var: &str, default_secs: u64) -> Result<Duration> {
    let secs = match env::var(var) {
        Ok(v) => v.parse().with_context(|| format!("{var} must be an integer number of seconds"))?,
        Err(_) => default_secs,
    };
    Ok(Duration::from_secs(secs))
}
