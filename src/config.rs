//! Process configuration from the environment

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_LOG_FILTER: &str = "activity_bot=info,tower_http=info";
const DEBUG_LOG_FILTER: &str = "activity_bot=debug,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Verbose logging when `RUST_LOG` is not set
    pub debug: bool,
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("ACTIVITY_BOT_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".activity-bot").join("activity-bot.db")
            },
            PathBuf::from,
        );

        let port = lookup("ACTIVITY_BOT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let debug = lookup("ACTIVITY_BOT_DEBUG")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Self {
            db_path,
            port,
            debug,
        }
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            DEBUG_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        }
    }
}
