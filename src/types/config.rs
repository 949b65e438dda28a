//! Configuration for radarmatch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{RadarError, RadarResult};

/// Main configuration for radarmatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Surface pool settings.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Render cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Render scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Renderer strategy settings.
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Score validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Score persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

/// Surface pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of idle surfaces kept on the free list.
    #[serde(default = "default_pool_size")]
    pub max_size: usize,

    /// Surface width in pixels.
    #[serde(default = "default_surface_side")]
    pub surface_width: u32,

    /// Surface height in pixels.
    #[serde(default = "default_surface_side")]
    pub surface_height: u32,

    /// Fill the free list at startup.
    #[serde(default = "default_true")]
    pub preallocate: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: default_pool_size(),
            surface_width: default_surface_side(),
            surface_height: default_surface_side(),
            preallocate: true,
        }
    }
}

fn default_pool_size() -> usize {
    20
}

fn default_surface_side() -> u32 {
    200
}

/// Render cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached surfaces.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    50
}

/// Render scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Debounce window per target (in milliseconds).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Interval between dispatch ticks (in milliseconds).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Maximum renders in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum requests dispatched per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Interval between metrics log lines (in seconds, 0 disables).
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

impl SchedulerConfig {
    /// Debounce window as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Tick interval as a [`Duration`].
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            tick_ms: default_tick_ms(),
            max_concurrent: default_max_concurrent(),
            batch_size: default_batch_size(),
            metrics_interval_secs: default_metrics_interval(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_tick_ms() -> u64 {
    16 // ~60 fps
}

fn default_max_concurrent() -> usize {
    3
}

fn default_batch_size() -> usize {
    5
}

fn default_metrics_interval() -> u64 {
    5
}

/// How chart pixels get drawn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Worker when a tokio runtime is available, inline otherwise.
    #[default]
    Auto,
    /// Draw during the scheduler tick.
    Inline,
    /// Draw on the blocking thread pool.
    Worker,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Auto => write!(f, "auto"),
            StrategyKind::Inline => write!(f, "inline"),
            StrategyKind::Worker => write!(f, "worker"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(StrategyKind::Auto),
            "inline" | "sync" => Ok(StrategyKind::Inline),
            "worker" => Ok(StrategyKind::Worker),
            other => Err(RadarError::config(format!(
                "unknown render strategy '{}'",
                other
            ))),
        }
    }
}

/// Renderer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Strategy chosen once at startup.
    #[serde(default)]
    pub strategy: StrategyKind,
}

/// Score validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Audit log length that triggers trimming.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,

    /// Entries kept after trimming.
    #[serde(default = "default_audit_retain")]
    pub audit_retain: usize,

    /// Log every audit entry at warn level.
    #[serde(default)]
    pub debug_audit: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            audit_capacity: default_audit_capacity(),
            audit_retain: default_audit_retain(),
            debug_audit: false,
        }
    }
}

fn default_audit_capacity() -> usize {
    100
}

fn default_audit_retain() -> usize {
    50
}

/// Score persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key prefix whose writes are validated.
    #[serde(default = "default_score_prefix")]
    pub score_prefix: String,

    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            score_prefix: default_score_prefix(),
            db_path: default_db_path(),
        }
    }
}

fn default_score_prefix() -> String {
    "ai_score_".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".radarmatch/scores.db")
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> RadarResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RadarResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            pool: PoolConfig::default(),
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig::default(),
            renderer: RendererConfig::default(),
            validation: ValidationConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("radarmatch.toml").unwrap_or_else(|_| Self::default_config())
    }

    /// Rejects settings the render pipeline cannot run with.
    pub fn validate(&self) -> RadarResult<()> {
        if self.pool.surface_width == 0 || self.pool.surface_height == 0 {
            return Err(RadarError::config("surface dimensions must be non-zero"));
        }
        if self.cache.capacity == 0 {
            return Err(RadarError::config("cache.capacity must be at least 1"));
        }
        if self.scheduler.max_concurrent == 0 {
            return Err(RadarError::config(
                "scheduler.max_concurrent must be at least 1",
            ));
        }
        if self.scheduler.batch_size == 0 {
            return Err(RadarError::config("scheduler.batch_size must be at least 1"));
        }
        if self.validation.audit_retain > self.validation.audit_capacity {
            return Err(RadarError::config(
                "validation.audit_retain cannot exceed audit_capacity",
            ));
        }
        if self.storage.score_prefix.is_empty() {
            return Err(RadarError::config("storage.score_prefix cannot be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
