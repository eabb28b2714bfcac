//! Configuration types for mrelic.
//!
//! [`Config::load`] reads `~/.config/mrelic/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist, then applies `MRELIC__`
//! environment overrides (e.g. `MRELIC__STORE__PATH`). [`Config::defaults`]
//! returns the same defaults without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[store]
path = "mrelic.jsonl"

[query]
scan_floor         = 5000
default_scan_limit = 1000

[cli]
page_size = 100
format    = "raw"

[feed]
service = ""
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub cli: CliConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

/// `[store]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("mrelic.jsonl") }

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

/// `[query]` section of `config.toml`.
///
/// Advanced queries are filtered in memory over a candidate window of
/// `max(limit, scan_floor)` rows; `default_scan_limit` stands in for a
/// missing limit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_scan_floor")]
    pub scan_floor: usize,
    #[serde(default = "default_scan_limit")]
    pub default_scan_limit: usize,
}

fn default_scan_floor() -> usize { 5000 }
fn default_scan_limit() -> usize { 1000 }

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            scan_floor: default_scan_floor(),
            default_scan_limit: default_scan_limit(),
        }
    }
}

/// `[cli]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_page_size() -> usize { 100 }
fn default_format() -> String { "raw".to_string() }

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            format: default_format(),
        }
    }
}

/// `[feed]` section of `config.toml`. An empty service means "use the
/// current directory name", as the line forwarder does.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/mrelic/config.toml`, layered on top of the
    /// built-in defaults and under environment overrides. Creates the file
    /// with defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        let cfg = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix("MRELIC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("mrelic")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
