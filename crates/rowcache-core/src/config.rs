//! Cache configuration, loaded from YAML with environment overrides.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ROWCACHE_CACHE_SIZE` | Maximum rows kept in the window (default: 500) |
//! | `ROWCACHE_LOOK_AHEAD` | Rows pre-fetched on a miss (default: 50) |
//! | `ROWCACHE_REWIND` | Re-open the source when an evicted row is requested |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};
use crate::window::{DEFAULT_CACHE_SIZE, DEFAULT_LOOK_AHEAD};

pub const ENV_CACHE_SIZE: &str = "ROWCACHE_CACHE_SIZE";
pub const ENV_LOOK_AHEAD: &str = "ROWCACHE_LOOK_AHEAD";
pub const ENV_REWIND: &str = "ROWCACHE_REWIND";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of rows retained. Raised to `2 * look_ahead` if smaller.
    pub cache_size: usize,

    /// Rows buffered past the requested range on a miss.
    /// Capped to `cache_size / 2`.
    pub look_ahead: usize,

    /// Open a fresh cursor when a row before the window is requested,
    /// instead of failing with `RowEvicted`.
    pub rewind_on_evicted: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            look_ahead: DEFAULT_LOOK_AHEAD,
            rewind_on_evicted: false,
        }
    }
}

impl CacheConfig {
    pub fn from_yaml_str(yaml: &str) -> CacheResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CacheError::config(format!("invalid cache config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CacheError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `ROWCACHE_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> CacheResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    pub(crate) fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CacheResult<Self> {
        if let Some(v) = lookup(ENV_CACHE_SIZE) {
            self.cache_size = parse_size(ENV_CACHE_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_LOOK_AHEAD) {
            self.look_ahead = parse_size(ENV_LOOK_AHEAD, &v)?;
        }
        if let Some(v) = lookup(ENV_REWIND) {
            self.rewind_on_evicted = v == "1" || v.eq_ignore_ascii_case("true");
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn with_look_ahead(mut self, look_ahead: usize) -> Self {
        self.look_ahead = look_ahead;
        self
    }

    pub fn with_rewind_on_evicted(mut self, rewind: bool) -> Self {
        self.rewind_on_evicted = rewind;
        self
    }

    pub fn validate(&self) -> CacheResult<()> {
        if self.cache_size == 0 {
            return Err(CacheError::config("cache_size must be > 0"));
        }
        if self.look_ahead == 0 {
            return Err(CacheError::config("look_ahead must be > 0"));
        }
        Ok(())
    }
}

fn parse_size(name: &str, value: &str) -> CacheResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| CacheError::config(format!("{} must be a positive integer, got {:?}", name, value)))
}
