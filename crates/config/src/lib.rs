//! Configuration loading, env substitution, and sentinel-file feature toggles.
//!
//! Config files: `sweeney.toml`, `sweeney.yaml`, or `sweeney.json`
//! Searched in `./` then `~/.config/sweeney/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod features;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    features::FeatureFlags,
    loader::{config_dir, discover_and_load, load_config, resolve_token},
    schema::{
        ActivityConfig, ActivityKind, DiscordConfig, EngineMode, FeaturesConfig, FetchConfig,
        ImageTriggerConfig, MatchingConfig, OcrConfig, SweeneyConfig, TextTriggerConfig,
        TriggersConfig,
    },
};
