//! Engine configuration (TOML file + environment), injected into each component.

pub mod engine;

pub use engine::{
    BackendConfig, CacheConfig, CategoryConfig, EngineConfig, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_ENGINE_CONFIG_PATH, ENV_ENGINE_CONFIG_PATH,
};
