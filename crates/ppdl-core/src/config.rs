//! Layered settings: command line > environment > credentials directory > `config.toml`.
//!
//! Each source produces a [`ConfigLayer`] with every field optional. Layers are
//! merged highest-precedence first and then resolved once into an immutable
//! [`Settings`], which is what the rest of the crate consumes.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Default number of downloader workers.
pub const DEFAULT_THREADS: usize = 4;

/// Name of the API key file inside `$CREDENTIALS_DIRECTORY`.
pub const API_KEY_CREDENTIAL: &str = "immich_api_key";

/// Environment variable systemd sets for `LoadCredential=`.
pub const CREDENTIALS_DIR_ENV: &str = "CREDENTIALS_DIRECTORY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("`after` and `last_days` cannot both be set")]
    ConflictingCutoff,
    #[error("`threads` must be at least 1")]
    InvalidThreads,
    #[error("invalid api url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Xdg(#[from] xdg::BaseDirectoriesError),
}

/// One source of settings. Unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// Immich API base, e.g. `https://photos.example.org/api`.
    pub api_url: Option<String>,
    /// Key needs the `asset.read` and `asset.download` permissions.
    pub api_key: Option<String>,
    pub person_id: Option<Uuid>,
    /// Only assets uploaded after this instant.
    pub after: Option<DateTime<Utc>>,
    /// Same as `after = now - last_days`.
    pub last_days: Option<u32>,
    pub save_to: Option<PathBuf>,
    pub threads: Option<usize>,
    pub dry: Option<bool>,
}

impl ConfigLayer {
    /// Fill unset fields of `self` from `lower`.
    ///
    /// The cutoff pair (`after`, `last_days`) is taken as a unit from the first
    /// layer that sets either, so a flag overrides a file value of the other kind.
    pub fn merge(self, lower: ConfigLayer) -> ConfigLayer {
        let (after, last_days) = if self.after.is_some() || self.last_days.is_some() {
            (self.after, self.last_days)
        } else {
            (lower.after, lower.last_days)
        };
        ConfigLayer {
            api_url: self.api_url.or(lower.api_url),
            api_key: self.api_key.or(lower.api_key),
            person_id: self.person_id.or(lower.person_id),
            after,
            last_days,
            save_to: self.save_to.or(lower.save_to),
            threads: self.threads.or(lower.threads),
            dry: self.dry.or(lower.dry),
        }
    }

    /// Parse a TOML config file.
    pub fn load_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `$XDG_CONFIG_HOME/ppdl/config.toml` if it exists; empty layer otherwise.
    pub fn load_default() -> Result<ConfigLayer, ConfigError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("ppdl")?;
        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load_file(&path)
            }
            None => Ok(ConfigLayer::default()),
        }
    }

    /// API key from `$CREDENTIALS_DIRECTORY/immich_api_key`, if that variable is set.
    pub fn from_credentials_env() -> Result<ConfigLayer, ConfigError> {
        let Some(dir) = std::env::var_os(CREDENTIALS_DIR_ENV) else {
            return Ok(ConfigLayer::default());
        };
        Ok(ConfigLayer {
            api_key: read_credential(Path::new(&dir), API_KEY_CREDENTIAL)?,
            ..ConfigLayer::default()
        })
    }
}

/// Read one credential file; a missing or blank file yields `None`.
pub fn read_credential(dir: &Path, name: &str) -> Result<Option<String>, ConfigError> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    let value = raw.trim_end();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Lower bound on upload time for the search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffFilter {
    NoCutoff,
    ExplicitTime(DateTime<Utc>),
    RelativeDays(u32),
}

impl CutoffFilter {
    pub fn from_parts(
        after: Option<DateTime<Utc>>,
        last_days: Option<u32>,
    ) -> Result<Self, ConfigError> {
        match (after, last_days) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingCutoff),
            (Some(t), None) => Ok(CutoffFilter::ExplicitTime(t)),
            (None, Some(n)) => Ok(CutoffFilter::RelativeDays(n)),
            (None, None) => Ok(CutoffFilter::NoCutoff),
        }
    }

    /// Effective cutoff relative to `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            CutoffFilter::NoCutoff => None,
            CutoffFilter::ExplicitTime(t) => Some(t),
            CutoffFilter::RelativeDays(n) => Some(now - Duration::days(i64::from(n))),
        }
    }
}

/// Fully resolved, validated settings for one run.
#[derive(Clone)]
pub struct Settings {
    /// Base URL without trailing slash.
    pub api_url: String,
    pub api_key: String,
    pub person_id: Uuid,
    pub created_after: Option<DateTime<Utc>>,
    pub save_to: PathBuf,
    pub threads: usize,
    pub dry: bool,
}

impl Settings {
    /// Validate a merged layer. `now` anchors `last_days`.
    pub fn resolve(layer: ConfigLayer, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let api_url = layer.api_url.ok_or(ConfigError::Missing("api_url"))?;
        url::Url::parse(&api_url).map_err(|source| ConfigError::InvalidUrl {
            url: api_url.clone(),
            source,
        })?;
        let api_key = layer.api_key.ok_or(ConfigError::Missing("api_key"))?;
        let person_id = layer.person_id.ok_or(ConfigError::Missing("person_id"))?;
        let cutoff = CutoffFilter::from_parts(layer.after, layer.last_days)?;
        let threads = layer.threads.unwrap_or(DEFAULT_THREADS);
        if threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        Ok(Settings {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            person_id,
            created_after: cutoff.resolve(now),
            save_to: layer.save_to.unwrap_or_else(|| PathBuf::from(".")),
            threads,
            dry: layer.dry.unwrap_or(false),
        })
    }

    /// Connection pool size: one per worker plus one for the lister.
    pub fn pool_size(&self) -> usize {
        self.threads + 1
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("person_id", &self.person_id)
            .field("created_after", &self.created_after)
            .field("save_to", &self.save_to)
            .field("threads", &self.threads)
            .field("dry", &self.dry)
            .finish()
    }
}
