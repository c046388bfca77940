//! Orchestration configuration.
//!
//! Resolution caching, the revocation interval policy and the tails
//! directory. Defaults match AnonCreds agent conventions (5 minute cache,
//! `from` must equal `to`). Override via environment variables, a YAML
//! file, or explicit construction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration shared by the resolution layer, the revocation
/// reconstructor, and the holder/verifier services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Consult and populate the resolution cache.
    pub use_cache: bool,
    /// How long a cached resolution stays fresh.
    pub cache_ttl_secs: u64,
    /// Write registry results into the cache.
    pub persist_in_cache: bool,
    /// Consult records of objects this process registered before the cache.
    pub use_local_record: bool,
    /// Widest accepted `to - from` of a non-revocation interval.
    /// `0` requires `from == to`.
    pub max_revocation_interval_secs: u64,
    /// Local directory tails files are downloaded into.
    pub tails_directory: PathBuf,
    /// `did:indy` namespace used when qualifying legacy identifiers.
    pub indy_namespace: Option<String>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_ttl_secs: 300,
            persist_in_cache: true,
            use_local_record: true,
            max_revocation_interval_secs: 0,
            tails_directory: std::env::temp_dir().join("ancr-tails"),
            indy_namespace: None,
        }
    }
}

impl OrchestrationConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ANCR_USE_CACHE` (default: true)
    /// - `ANCR_CACHE_TTL_SECS` (default: 300)
    /// - `ANCR_PERSIST_IN_CACHE` (default: true)
    /// - `ANCR_USE_LOCAL_RECORD` (default: true)
    /// - `ANCR_MAX_REVOCATION_INTERVAL_SECS` (default: 0)
    /// - `ANCR_TAILS_DIR` (default: `$TMPDIR/ancr-tails`)
    /// - `ANCR_INDY_NAMESPACE` (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            use_cache: env_parse("ANCR_USE_CACHE", defaults.use_cache)?,
            cache_ttl_secs: env_parse("ANCR_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            persist_in_cache: env_parse("ANCR_PERSIST_IN_CACHE", defaults.persist_in_cache)?,
            use_local_record: env_parse("ANCR_USE_LOCAL_RECORD", defaults.use_local_record)?,
            max_revocation_interval_secs: env_parse(
                "ANCR_MAX_REVOCATION_INTERVAL_SECS",
                defaults.max_revocation_interval_secs,
            )?,
            tails_directory: std::env::var("ANCR_TAILS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.tails_directory),
            indy_namespace: std::env::var("ANCR_INDY_NAMESPACE").ok().filter(|s| !s.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject combinations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_cache && self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "use_cache requires a non-zero cache_ttl_secs".to_string(),
            ));
        }
        if let Some(ns) = &self.indy_namespace {
            if ns.trim().is_empty() || ns.contains('/') {
                return Err(ConfigError::Invalid(format!("invalid did:indy namespace {ns:?}")));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {0}: {1:?}")]
    InvalidVar(String, String),
    /// The configuration file could not be read.
    #[error("cannot read configuration file {0}: {1}")]
    Read(String, String),
    /// The configuration document could not be parsed.
    #[error("cannot parse configuration: {0}")]
    Parse(String),
    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
