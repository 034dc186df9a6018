use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::session::SessionStore;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_JOBS_PAGE_SIZE: usize = 6;
pub const DEFAULT_APPLICATIONS_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub jobs_page_size: usize,
    pub applications_page_size: usize,
    pub session_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            jobs_page_size: DEFAULT_JOBS_PAGE_SIZE,
            applications_page_size: DEFAULT_APPLICATIONS_PAGE_SIZE,
            session_path: SessionStore::default_path(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Config::default();

        if let Some(url) = get("JOBDESK_API_URL") {
            config.api_url = url;
        }
        if let Some(size) = get("JOBDESK_PAGE_SIZE") {
            config.jobs_page_size = size
                .parse()
                .with_context(|| format!("JOBDESK_PAGE_SIZE must be a number, got '{}'", size))?;
        }
        if let Some(size) = get("JOBDESK_APPLICATIONS_PAGE_SIZE") {
            config.applications_page_size = size.parse().with_context(|| {
                format!("JOBDESK_APPLICATIONS_PAGE_SIZE must be a number, got '{}'", size)
            })?;
        }
        if let Some(path) = get("JOBDESK_SESSION_PATH") {
            config.session_path = expand_home(&path);
        }

        Ok(config)
    }
}

pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(path),
    }
}
