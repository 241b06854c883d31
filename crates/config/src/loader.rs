use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::{DiscordConfig, SweeneyConfig},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "sweeney.toml",
    "sweeney.yaml",
    "sweeney.yml",
    "sweeney.json",
];

/// Environment variable consulted when the config carries no token.
pub const TOKEN_ENV_VAR: &str = "SWEENEY_DISCORD_TOKEN";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<SweeneyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./sweeney.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/sweeney/sweeney.{toml,yaml,yml,json}` (user-global)
///
/// Returns `SweeneyConfig::default()` if no config file is found.
pub fn discover_and_load() -> SweeneyConfig {
    load_or_default(find_config_file())
}

fn load_or_default(path: Option<PathBuf>) -> SweeneyConfig {
    if let Some(path) = path {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    SweeneyConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/sweeney/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "sweeney").map(|d| d.config_dir().to_path_buf())
}

/// Resolve the bot token.
///
/// Order: `discord.token` → `SWEENEY_DISCORD_TOKEN` → contents of
/// `discord.token_file`. Surrounding whitespace is trimmed.
pub fn resolve_token(discord: &DiscordConfig) -> Result<Secret<String>> {
    resolve_token_with(discord, |name| std::env::var(name).ok())
}

fn resolve_token_with(
    discord: &DiscordConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Secret<String>> {
    let token = match discord.token.as_ref() {
        Some(token) if !token.expose_secret().trim().is_empty() => {
            token.expose_secret().trim().to_string()
        },
        _ => match lookup(TOKEN_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            Some(token) => token.trim().to_string(),
            None => std::fs::read_to_string(&discord.token_file)
                .with_context(|| {
                    format!("failed to read token file {}", discord.token_file.display())
                })?
                .trim()
                .to_string(),
        },
    };

    if token.is_empty() {
        return Err(Error::message("discord token is empty"));
    }
    Ok(Secret::new(token))
}

fn parse_config(raw: &str, path: &Path) -> Result<SweeneyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
