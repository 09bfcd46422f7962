//! Application configuration for remotejobs.
//!
//! User config lives at `~/.remotejobs/remotejobs.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RemoteJobsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "remotejobs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".remotejobs";

/// Browser User-Agent sent on browser-style requests.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching remotejobs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP request defaults.
    #[serde(default)]
    pub http: HttpConfig,

    /// Refresh behavior.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Per-source settings.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the libSQL database file. A leading `~/` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Resolve `db_path`, expanding a leading `~/`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match self.db_path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    RemoteJobsError::config("could not determine home directory")
                })?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.db_path)),
        }
    }
}

fn default_db_path() -> String {
    "~/.remotejobs/jobs.db".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User-Agent for browser-style requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language for browser-style requests.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Maximum concurrent detail-page fetches within one listing page.
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            detail_concurrency: default_detail_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}
fn default_max_redirects() -> usize {
    30
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_accept_language() -> String {
    "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7".into()
}
fn default_detail_concurrency() -> usize {
    16
}

/// What a refresh does when one source fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Keep the sources that succeeded and report the ones that failed.
    #[default]
    Isolate,
    /// Abort the whole refresh, persisting nothing.
    FailFast,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Isolate => f.write_str("isolate"),
            FailurePolicy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// `[refresh]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Behavior on a source-level failure.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Trailing window, in hours, served by the read path.
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            recent_window_hours: default_recent_window_hours(),
        }
    }
}

fn default_recent_window_hours() -> u32 {
    24
}

/// A single `[sources.<name>]` entry.
///
/// Deserialized over the source's built-in entry, so any field left out of
/// the file keeps its default.
#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    /// Whether the source runs during a refresh.
    pub enabled: bool,
    /// Listing page fetched on every refresh.
    pub listing_url: String,
    /// Base that relative posting links are resolved against.
    pub base_url: String,
}

impl SourceEntry {
    fn enabled(listing_url: &str, base_url: &str) -> Self {
        Self {
            enabled: true,
            listing_url: listing_url.into(),
            base_url: base_url.into(),
        }
    }
}

/// The fields a `[sources.<name>]` table may override.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceOverride {
    enabled: Option<bool>,
    listing_url: Option<String>,
    base_url: Option<String>,
}

fn merge_entry<'de, D>(
    deserializer: D,
    base: SourceEntry,
) -> std::result::Result<SourceEntry, D::Error>
where
    D: Deserializer<'de>,
{
    let over = SourceOverride::deserialize(deserializer)?;
    Ok(SourceEntry {
        enabled: over.enabled.unwrap_or(base.enabled),
        listing_url: over.listing_url.unwrap_or(base.listing_url),
        base_url: over.base_url.unwrap_or(base.base_url),
    })
}

fn weworkremotely_entry<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<SourceEntry, D::Error> {
    merge_entry(d, default_weworkremotely())
}

fn remoteok_entry<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<SourceEntry, D::Error> {
    merge_entry(d, default_remoteok())
}

fn remoteco_entry<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<SourceEntry, D::Error> {
    merge_entry(d, default_remoteco())
}

/// `[sources]` section: one entry per supported job board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(
        default = "default_weworkremotely",
        deserialize_with = "weworkremotely_entry"
    )]
    pub weworkremotely: SourceEntry,

    #[serde(default = "default_remoteok", deserialize_with = "remoteok_entry")]
    pub remoteok: SourceEntry,

    #[serde(default = "default_remoteco", deserialize_with = "remoteco_entry")]
    pub remoteco: SourceEntry,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            weworkremotely: default_weworkremotely(),
            remoteok: default_remoteok(),
            remoteco: default_remoteco(),
        }
    }
}

fn default_weworkremotely() -> SourceEntry {
    SourceEntry::enabled(
        "https://weworkremotely.com/categories/remote-full-stack-programming-jobs",
        "https://weworkremotely.com/",
    )
}
fn default_remoteok() -> SourceEntry {
    SourceEntry::enabled(
        "https://remoteok.com/remote-engineer-jobs?order_by=date",
        "https://remoteok.com/",
    )
}
fn default_remoteco() -> SourceEntry {
    SourceEntry::enabled("https://remote.co/remote-jobs/developer/", "https://remote.co/")
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Immutable request settings handed to every source fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Redirect limit.
    pub max_redirects: usize,
    /// User-Agent for browser-style requests.
    pub user_agent: String,
    /// Accept-Language for browser-style requests.
    pub accept_language: String,
    /// Concurrency bound for detail-page enrichment.
    pub detail_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.http.timeout_secs),
            max_redirects: config.http.max_redirects,
            user_agent: config.http.user_agent.clone(),
            accept_language: config.http.accept_language.clone(),
            detail_concurrency: config.http.detail_concurrency.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.remotejobs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RemoteJobsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.remotejobs/remotejobs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RemoteJobsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RemoteJobsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| RemoteJobsError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RemoteJobsError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| RemoteJobsError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("failure_policy = \"isolate\""));
        assert!(toml_str.contains("weworkremotely.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.http.max_redirects, 30);
        assert_eq!(parsed.refresh.recent_window_hours, 24);
        assert_eq!(parsed.refresh.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[refresh]
failure_policy = "fail-fast"

[sources.remoteco]
enabled = false
listing_url = "http://localhost:9000/jobs"
base_url = "http://localhost:9000/"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.refresh.failure_policy, FailurePolicy::FailFast);
        assert!(!config.sources.remoteco.enabled);
        assert!(config.sources.remoteok.enabled);
        assert_eq!(config.http.timeout_secs, 15);
    }

    #[test]
    fn source_entry_keeps_unset_fields() {
        let config: AppConfig =
            toml::from_str("[sources.remoteco]\nenabled = false\n").expect("parse");
        assert!(!config.sources.remoteco.enabled);
        assert_eq!(
            config.sources.remoteco.listing_url,
            "https://remote.co/remote-jobs/developer/"
        );
        assert_eq!(config.sources.remoteco.base_url, "https://remote.co/");

        let config: AppConfig = toml::from_str(
            "[sources.remoteok]\nlisting_url = \"http://localhost:9000/jobs\"\n",
        )
        .expect("parse");
        assert!(config.sources.remoteok.enabled);
        assert_eq!(config.sources.remoteok.listing_url, "http://localhost:9000/jobs");
        assert_eq!(config.sources.remoteok.base_url, "https://remoteok.com/");
        assert_eq!(
            config.sources.weworkremotely.base_url,
            "https://weworkremotely.com/"
        );
    }

    #[test]
    fn unknown_source_field_is_rejected() {
        let err = toml::from_str::<AppConfig>("[sources.remoteok]\nlisting = \"x\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn fetch_config_from_app_config() {
        let mut app = AppConfig::default();
        app.http.detail_concurrency = 0;
        let fetch = FetchConfig::from(&app);
        assert_eq!(fetch.timeout, Duration::from_secs(15));
        assert_eq!(fetch.max_redirects, 30);
        assert_eq!(fetch.detail_concurrency, 1);
        assert!(fetch.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn db_path_expansion() {
        let storage = StorageConfig {
            db_path: "/tmp/jobs.db".into(),
        };
        assert_eq!(storage.resolved_db_path().unwrap(), PathBuf::from("/tmp/jobs.db"));

        let home_relative = StorageConfig::default();
        let resolved = home_relative.resolved_db_path().unwrap();
        assert!(resolved.ends_with(".remotejobs/jobs.db"));
    }

    #[test]
    fn init_then_load_roundtrips_on_disk() {
        let path = std::env::temp_dir()
            .join(format!("rj_cfg_{}", uuid::Uuid::now_v7()))
            .join("remotejobs.toml");
        init_config_at(&path).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.http.detail_concurrency, 16);
        assert!(loaded.sources.remoteco.enabled);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let path = std::env::temp_dir().join(format!("rj_bad_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "[http\ntimeout_secs = ").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, RemoteJobsError::Config { .. }));
    }
}
