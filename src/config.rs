use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub trends: TrendConfig,

    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/search-trends.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Normalized queries shorter than this (in characters) are not recorded.
    pub min_query_length: usize,

    pub daily_window_hours: u32,

    pub weekly_window_days: u32,

    /// Idle time after which low-count records become eligible for eviction.
    pub stale_after_days: u32,

    /// Records with a lifetime count below this are evicted once stale.
    pub evict_below_count: i64,

    /// Budget for a single background increment before it is abandoned.
    pub track_timeout_ms: u64,

    /// Budget for each maintenance step.
    pub step_timeout_seconds: u64,

    /// How long a trending list is served from memory. 0 disables caching.
    pub cache_ttl_seconds: u64,

    pub default_limit: u64,

    pub max_limit: u64,

    pub classifier: ClassifierConfig,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_query_length: 2,
            daily_window_hours: 24,
            weekly_window_days: 7,
            stale_after_days: 30,
            evict_below_count: 3,
            track_timeout_ms: 250,
            step_timeout_seconds: 60,
            cache_ttl_seconds: 30,
            default_limit: 10,
            max_limit: 100,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TrendConfig {
    #[must_use]
    pub fn daily_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.daily_window_hours))
    }

    #[must_use]
    pub fn weekly_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.weekly_window_days))
    }

    #[must_use]
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.stale_after_days))
    }

    #[must_use]
    pub const fn track_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.track_timeout_ms)
    }

    #[must_use]
    pub const fn step_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.step_timeout_seconds)
    }

    /// Clamps a caller-supplied limit into `[1, max_limit]`.
    #[must_use]
    pub fn clamp_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

/// Thresholds for the up/down/stable classification.
///
/// A query's recent share is `daily / max(weekly, 1)`. With uniform traffic
/// over a seven day week that share sits at `baseline_share`; the factors
/// set how far above or below that baseline a query must be to move.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub baseline_share: f64,

    pub up_factor: f64,

    pub down_factor: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            baseline_share: 1.0 / 7.0,
            up_factor: 1.2,
            down_factor: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Hours between maintenance passes (default: 24)
    pub maintenance_interval_hours: u32,

    /// Overrides the interval when set, e.g. "0 30 3 * * *".
    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            maintenance_interval_hours: 24,
            cron_expression: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "search-trends".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("search-trends").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".search-trends").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let trends = &self.trends;

        if trends.min_query_length == 0 {
            anyhow::bail!("trends.min_query_length must be at least 1");
        }

        if trends.daily_window_hours == 0 || trends.weekly_window_days == 0 {
            anyhow::bail!("Trend windows must be greater than zero");
        }

        if u64::from(trends.weekly_window_days) * 24 < u64::from(trends.daily_window_hours) {
            anyhow::bail!("The weekly window cannot be shorter than the daily window");
        }

        if trends.stale_after_days == 0 {
            anyhow::bail!("trends.stale_after_days must be greater than zero");
        }

        if trends.max_limit == 0 {
            anyhow::bail!("trends.max_limit must be greater than zero");
        }

        let classifier = &trends.classifier;
        if !(classifier.baseline_share > 0.0 && classifier.baseline_share <= 1.0) {
            anyhow::bail!("classifier.baseline_share must be in (0, 1]");
        }

        if classifier.down_factor >= classifier.up_factor {
            anyhow::bail!("classifier.down_factor must be lower than classifier.up_factor");
        }

        if self.scheduler.enabled
            && self.scheduler.maintenance_interval_hours == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler interval must be > 0 or cron expression must be set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.trends.min_query_length, 2);
        assert_eq!(config.trends.daily_window(), chrono::Duration::hours(24));
        assert_eq!(config.trends.weekly_window(), chrono::Duration::days(7));
        assert_eq!(config.trends.stale_after(), chrono::Duration::days(30));
        assert_eq!(config.trends.evict_below_count, 3);
        assert_eq!(config.scheduler.maintenance_interval_hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[trends]"));
        assert!(toml_str.contains("[trends.classifier]"));
        assert!(toml_str.contains("[scheduler]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [trends]
            stale_after_days = 60

            [trends.classifier]
            up_factor = 1.5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.trends.stale_after_days, 60);
        assert!((config.trends.classifier.up_factor - 1.5).abs() < f64::EPSILON);
        assert!((config.trends.classifier.down_factor - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.trends.daily_window_hours, 24);
    }

    #[test]
    fn test_validate_rejects_inverted_factors() {
        let mut config = Config::default();
        config.trends.classifier.down_factor = 1.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval_without_cron() {
        let mut config = Config::default();
        config.scheduler.maintenance_interval_hours = 0;
        assert!(config.validate().is_err());

        config.scheduler.cron_expression = Some("0 0 3 * * *".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_limit() {
        let trends = TrendConfig::default();
        assert_eq!(trends.clamp_limit(None), 10);
        assert_eq!(trends.clamp_limit(Some(0)), 1);
        assert_eq!(trends.clamp_limit(Some(5000)), 100);
    }
}
