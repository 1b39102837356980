// src/config/engine.rs
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::scoring::{Category, Vendor};

pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "HUMANIZER_CONFIG_PATH";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

fn env_marker() -> String {
    "ENV".to_string()
}
fn default_true() -> bool {
    true
}
fn default_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

/// One external scoring backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub vendor: Vendor,
    /// "ENV" means: read from the vendor's `*_API_KEY` variable.
    #[serde(default = "env_marker")]
    pub api_key: String,
    /// Endpoint override (tests, proxies). Defaults to the vendor's public URL.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Per-call timeout; 0 means the category default (30s detection, 60s plagiarism).
    #[serde(default)]
    pub timeout_secs: u64,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl CategoryConfig {
    pub fn for_category(category: Category) -> Self {
        Self {
            timeout_secs: category.default_timeout().as_secs(),
            backends: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// File-backed cache directory; in-memory when absent.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Everything the engine needs, injected at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "detection_defaults")]
    pub detection: CategoryConfig,
    #[serde(default = "plagiarism_defaults")]
    pub plagiarism: CategoryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

fn detection_defaults() -> CategoryConfig {
    CategoryConfig::for_category(Category::Detection)
}
fn plagiarism_defaults() -> CategoryConfig {
    CategoryConfig::for_category(Category::Plagiarism)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection: detection_defaults(),
            plagiarism: plagiarism_defaults(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load using `$HUMANIZER_CONFIG_PATH` or `config/engine.toml`; a missing file
    /// yields defaults. Keys are resolved from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_ENGINE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH));
        let cfg = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            tracing::info!(path = %path.display(), "no engine config file; using defaults");
            Self::default()
        };
        Ok(cfg.resolve_with(|k| env::var(k).ok()))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: EngineConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    /// Fix out-of-range values instead of rejecting the file.
    fn sanitized(mut self) -> Self {
        for (cat, c) in [
            (Category::Detection, &mut self.detection),
            (Category::Plagiarism, &mut self.plagiarism),
        ] {
            if c.timeout_secs == 0 {
                c.timeout_secs = cat.default_timeout().as_secs();
            }
        }
        if self.cache.ttl_secs == 0 {
            self.cache.ttl_secs = DEFAULT_CACHE_TTL_SECS;
        }
        self
    }

    /// Resolve "ENV" api keys through `lookup`. With no backends configured at all,
    /// every vendor whose key is present is enabled for the categories it serves.
    pub fn resolve_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let none_configured = self.detection.backends.is_empty() && self.plagiarism.backends.is_empty();
        if none_configured {
            for (cat, c) in [
                (Category::Detection, &mut self.detection),
                (Category::Plagiarism, &mut self.plagiarism),
            ] {
                for vendor in Vendor::defaults_for(cat) {
                    if lookup(vendor.env_key()).is_some_and(|k| !k.trim().is_empty()) {
                        c.backends.push(BackendConfig {
                            vendor: *vendor,
                            api_key: env_marker(),
                            url: None,
                        });
                    }
                }
            }
        }

        for c in [&mut self.detection, &mut self.plagiarism] {
            for b in c.backends.iter_mut() {
                if b.api_key.trim().eq_ignore_ascii_case("env") {
                    b.api_key = lookup(b.vendor.env_key()).unwrap_or_default();
                    if b.api_key.is_empty() {
                        tracing::warn!(
                            vendor = b.vendor.as_str(),
                            var = b.vendor.env_key(),
                            "api key env var missing"
                        );
                    }
                }
            }
        }
        self
    }
}
