//! Configuration for fleetwatch
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/fleetwatch/config.toml)
//! 3. Built-in defaults (lowest priority)
//!
//! See SPEC_FULL.md §B for the full environment variable table.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

mod observability;

pub use observability::{FileLogging, LogRotation, LoggingConfig};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct MailerConfig {
    pub smtp_host: Option<String>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub report_to: Option<String>,
}

impl MailerConfig {
    /// Whether enough is configured to actually send mail. Per spec §7, a
    /// report worker enabled without this is a Fatal startup error.
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.report_to.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub index: IndexConfig,
    pub inventory: InventoryConfig,
    pub mailer: MailerConfig,
    pub health_interval: Duration,
    pub report_interval: Duration,
    /// Whether the report worker should run at all (disabled when the
    /// mailer isn't configured and the operator hasn't asked for it).
    pub report_enabled: bool,
    pub logging: LoggingConfig,
    pub demo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: IndexConfig {
                url: "http://127.0.0.1:9200".to_string(),
                username: None,
                password: None,
            },
            inventory: InventoryConfig {
                db_path: PathBuf::from("./fleetwatch.db"),
            },
            mailer: MailerConfig::default(),
            health_interval: Duration::from_secs(10),
            report_interval: Duration::from_secs(86_400),
            report_enabled: false,
            logging: LoggingConfig::default(),
            demo: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub index_url: Option<String>,
    pub db_path: Option<String>,
    pub report_to: Option<String>,
    pub health_interval_secs: Option<u64>,
    pub report_interval_secs: Option<u64>,
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// ~/.config/fleetwatch/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("fleetwatch").join("config.toml"))
    }

    /// Load file config if it exists.
    ///
    /// # Panics
    /// If the config file exists but cannot be parsed. A broken config
    /// should fail fast with a clear error, not silently fall back to
    /// defaults while the operator debugs the wrong thing.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("CONFIG ERROR - failed to parse {}: {e}", path.display());
                std::process::exit(1);
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("CONFIG ERROR - cannot read {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars -> file -> defaults. Returns `Err` with
    /// an explanatory message when the loaded config is invalid for
    /// startup (spec §7: configuration errors are Fatal, raised before the
    /// supervisor starts).
    pub fn from_env() -> anyhow::Result<Self> {
        let file = Self::load_file_config();
        let defaults = Self::default();

        let index = IndexConfig {
            url: std::env::var("FLEETWATCH_INDEX_URL")
                .ok()
                .or(file.index_url)
                .unwrap_or(defaults.index.url),
            username: std::env::var("FLEETWATCH_INDEX_USER").ok(),
            password: std::env::var("FLEETWATCH_INDEX_PASSWORD").ok(),
        };

        let inventory = InventoryConfig {
            db_path: std::env::var("FLEETWATCH_DB_PATH")
                .ok()
                .or(file.db_path)
                .map(PathBuf::from)
                .unwrap_or(defaults.inventory.db_path),
        };

        let mailer = MailerConfig {
            smtp_host: std::env::var("FLEETWATCH_SMTP_HOST").ok(),
            smtp_user: std::env::var("FLEETWATCH_SMTP_USER").ok(),
            smtp_password: std::env::var("FLEETWATCH_SMTP_PASSWORD").ok(),
            report_to: std::env::var("FLEETWATCH_REPORT_TO").ok().or(file.report_to),
        };

        let health_interval = std::env::var("FLEETWATCH_HEALTH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.health_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.health_interval);

        let report_interval = std::env::var("FLEETWATCH_REPORT_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.report_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.report_interval);

        let report_enabled = mailer.is_configured();

        let logging = LoggingConfig::from_file(file.logging);
        let logging = LoggingConfig {
            level: std::env::var("FLEETWATCH_LOG_LEVEL").unwrap_or(logging.level),
            file_dir: std::env::var("FLEETWATCH_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(logging.file_dir),
            file_enabled: true,
            ..logging
        };

        let demo = std::env::var("FLEETWATCH_DEMO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            index,
            inventory,
            mailer,
            health_interval,
            report_interval,
            report_enabled,
            logging,
            demo,
        })
    }
}
