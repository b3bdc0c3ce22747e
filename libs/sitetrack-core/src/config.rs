//! Configuration for the SiteTrack client
//!
//! Values are layered: built-in defaults, then a YAML or JSON file, then
//! `SITETRACK_*` environment variables. Each source yields a [`ConfigOverlay`]
//! holding only the values it sets, so a later source always wins, even when
//! it repeats a default. Command-line flags are applied on top by the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use sitetrack_common::{
    DEFAULT_ADMIN_POLL_SECS, DEFAULT_API_BASE_URL, DEFAULT_FINANCIAL_POLL_SECS,
    DEFAULT_SUPERVISOR_POLL_SECS,
};

use crate::error::{Result, SiteTrackError};
use crate::roles::DashboardKind;

/// Environment variable holding the API base URL
pub const ENV_API_URL: &str = "SITETRACK_API_URL";
/// Environment variable holding the bearer token
pub const ENV_API_TOKEN: &str = "SITETRACK_API_TOKEN";
/// Environment variable overriding every poll interval, in seconds
pub const ENV_POLL_INTERVAL: &str = "SITETRACK_POLL_INTERVAL_SECS";
/// Environment variable holding the request timeout, in seconds
pub const ENV_REQUEST_TIMEOUT: &str = "SITETRACK_REQUEST_TIMEOUT_SECS";

/// Client configuration
///
/// Intervals and timeouts are whole seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteTrackConfig {
    /// Base URL of the REST API, e.g. `http://localhost:5000/api`
    pub api_base_url: String,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    /// Per-request timeout; `None` leaves the HTTP client's default
    pub request_timeout: Option<u64>,
    pub admin_poll_interval: u64,
    pub supervisor_poll_interval: u64,
    /// Used by dashboards that show financial figures
    pub financial_poll_interval: u64,
    /// Replaces each material's reorder level in low-stock checks
    pub low_stock_threshold_override: Option<f64>,
}

impl Default for SiteTrackConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout: None,
            admin_poll_interval: DEFAULT_ADMIN_POLL_SECS,
            supervisor_poll_interval: DEFAULT_SUPERVISOR_POLL_SECS,
            financial_poll_interval: DEFAULT_FINANCIAL_POLL_SECS,
            low_stock_threshold_override: None,
        }
    }
}

impl SiteTrackConfig {
    /// Defaults overlaid with `SITETRACK_*` environment variables
    ///
    /// # Errors
    /// Returns `SiteTrackError::Configuration` when a numeric variable does not parse
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply(&ConfigOverlay::from_env()?);
        Ok(config)
    }

    /// Load a configuration file; `.yaml`/`.yml` parse as YAML, anything else as JSON
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_config_file(path.as_ref())
    }

    /// Save the configuration as `"json"` or `"yaml"`
    ///
    /// # Errors
    /// Returns an error for an unsupported format or a failed write
    pub fn to_file<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<()> {
        let path = path.as_ref();
        let content = match format {
            "yaml" | "yml" => serde_yaml::to_string(self).map_err(|e| {
                SiteTrackError::configuration(format!("Failed to serialize YAML: {e}"))
            })?,
            "json" => serde_json::to_string_pretty(self)?,
            _ => {
                return Err(SiteTrackError::configuration(format!(
                    "Unsupported format: {format}"
                )))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overwrite every value `overlay` sets
    pub fn apply(&mut self, overlay: &ConfigOverlay) {
        if let Some(url) = &overlay.api_base_url {
            self.api_base_url.clone_from(url);
        }
        if overlay.api_token.is_some() {
            self.api_token.clone_from(&overlay.api_token);
        }
        if overlay.request_timeout.is_some() {
            self.request_timeout = overlay.request_timeout;
        }
        if let Some(secs) = overlay.admin_poll_interval {
            self.admin_poll_interval = secs;
        }
        if let Some(secs) = overlay.supervisor_poll_interval {
            self.supervisor_poll_interval = secs;
        }
        if let Some(secs) = overlay.financial_poll_interval {
            self.financial_poll_interval = secs;
        }
        if overlay.low_stock_threshold_override.is_some() {
            self.low_stock_threshold_override = overlay.low_stock_threshold_override;
        }
    }

    /// Check the configuration for values the client cannot run with
    ///
    /// # Errors
    /// Returns `SiteTrackError::Configuration` for an unparsable or non-HTTP
    /// base URL, a zero interval or timeout, or a negative stock threshold
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base_url).map_err(|e| {
            SiteTrackError::configuration(format!(
                "Invalid API base URL {}: {e}",
                self.api_base_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SiteTrackError::configuration(format!(
                "API base URL must use http or https, got {}",
                url.scheme()
            )));
        }

        for (name, value) in [
            ("admin_poll_interval", self.admin_poll_interval),
            ("supervisor_poll_interval", self.supervisor_poll_interval),
            ("financial_poll_interval", self.financial_poll_interval),
        ] {
            if value == 0 {
                return Err(SiteTrackError::configuration(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        if self.request_timeout == Some(0) {
            return Err(SiteTrackError::configuration(
                "request_timeout must be greater than 0",
            ));
        }
        if self
            .low_stock_threshold_override
            .is_some_and(|t| t < 0.0 || !t.is_finite())
        {
            return Err(SiteTrackError::configuration(
                "low_stock_threshold_override must be a non-negative number",
            ));
        }
        Ok(())
    }

    /// Refresh interval for a dashboard kind
    #[must_use]
    pub fn poll_interval_for(&self, kind: DashboardKind) -> Duration {
        let secs = match kind {
            DashboardKind::Admin => self.admin_poll_interval,
            DashboardKind::SiteSupervisor => self.supervisor_poll_interval,
            DashboardKind::Client => self.financial_poll_interval,
            DashboardKind::ProjectManager | DashboardKind::Inventory => self.admin_poll_interval,
        };
        Duration::from_secs(secs)
    }

    /// Request timeout as a `Duration`
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }
}

/// The values one configuration source sets; `None` leaves the target untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout: Option<u64>,
    pub admin_poll_interval: Option<u64>,
    pub supervisor_poll_interval: Option<u64>,
    pub financial_poll_interval: Option<u64>,
    pub low_stock_threshold_override: Option<f64>,
}

impl ConfigOverlay {
    /// The `SITETRACK_*` variables that are set
    ///
    /// `SITETRACK_POLL_INTERVAL_SECS` sets every poll interval. A blank token
    /// counts as unset.
    ///
    /// # Errors
    /// Returns `SiteTrackError::Configuration` when a numeric variable does not parse
    pub fn from_env() -> Result<Self> {
        let mut overlay = Self {
            api_base_url: std::env::var(ENV_API_URL).ok(),
            api_token: std::env::var(ENV_API_TOKEN)
                .ok()
                .filter(|token| !token.trim().is_empty()),
            ..Self::default()
        };

        if let Some(secs) = env_secs(ENV_POLL_INTERVAL)? {
            overlay.admin_poll_interval = Some(secs);
            overlay.supervisor_poll_interval = Some(secs);
            overlay.financial_poll_interval = Some(secs);
        }
        overlay.request_timeout = env_secs(ENV_REQUEST_TIMEOUT)?;
        Ok(overlay)
    }

    /// The keys present in a YAML or JSON configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_config_file(path.as_ref())
    }
}

fn env_secs(key: &str) -> Result<Option<u64>> {
    std::env::var(key)
        .ok()
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| SiteTrackError::configuration(format!("Invalid {key} value")))
        })
        .transpose()
}

/// Read `path` as YAML (`.yaml`/`.yml`) or JSON
fn read_config_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SiteTrackError::Io(std::io::Error::other(format!(
            "Failed to read config file {}: {e}",
            path.display()
        )))
    })?;

    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| {
            SiteTrackError::configuration(format!("Failed to parse YAML config: {e}"))
        })
    } else {
        serde_json::from_str(&content).map_err(|e| {
            SiteTrackError::configuration(format!("Failed to parse JSON config: {e}"))
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

/// Loads configuration from files and the environment with precedence
pub struct ConfigLoader {
    base_config: SiteTrackConfig,
    config_paths: Vec<PathBuf>,
    load_from_env: bool,
    validate: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: SiteTrackConfig::default(),
            config_paths: Self::default_config_paths(),
            load_from_env: true,
            validate: true,
        }
    }

    #[must_use]
    pub fn with_base_config(mut self, config: SiteTrackConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Replace the candidate file list
    #[must_use]
    pub fn with_config_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.config_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    #[must_use]
    pub fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources
    ///
    /// Missing files are skipped. An explicitly given file that fails to parse
    /// is an error, as is an invalid final configuration.
    ///
    /// # Errors
    /// Returns an error if a present file is malformed, an environment variable
    /// does not parse, or validation fails
    pub fn load(&self) -> Result<SiteTrackConfig> {
        let mut config = self.base_config.clone();

        for path in &self.config_paths {
            if !path.exists() {
                debug!("Configuration file not found: {}", path.display());
                continue;
            }
            let overlay = ConfigOverlay::from_file(path).map_err(|e| {
                warn!("Failed to load configuration from {}: {e}", path.display());
                e
            })?;
            config.apply(&overlay);
            info!("Loaded configuration from {}", path.display());
        }

        if self.load_from_env {
            config.apply(&ConfigOverlay::from_env()?);
        }

        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    /// Candidate files: the working directory, then the user config directory
    #[must_use]
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("sitetrack.yaml"),
            PathBuf::from("sitetrack.yml"),
            PathBuf::from("sitetrack.json"),
        ];
        if let Some(dir) = Self::user_config_dir() {
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
        }
        paths
    }

    /// `$HOME/.config/sitetrack`, or the Windows roaming profile equivalent
    #[must_use]
    pub fn user_config_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".config").join("sitetrack"))
        } else if let Ok(profile) = std::env::var("USERPROFILE") {
            Some(
                PathBuf::from(profile)
                    .join("AppData")
                    .join("Roaming")
                    .join("sitetrack"),
            )
        } else {
            None
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
