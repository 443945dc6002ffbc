//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::infra::git::Backend;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static REPO_CONFIG_PATH: &str = ".repolink/config.toml";

/// Layered configuration loaded from defaults, user, repository, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Every field is optional so a layer only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    remote: Option<String>,
    #[serde(default)]
    backend: Option<Backend>,
    #[serde(default)]
    copy_to_clipboard: Option<bool>,
}

impl Defaults {
    fn default_remote() -> &'static str {
        "origin"
    }

    pub fn remote(&self) -> &str {
        self.remote.as_deref().unwrap_or(Self::default_remote())
    }

    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn copy_to_clipboard(&self) -> bool {
        self.copy_to_clipboard.unwrap_or(true)
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    remote: Option<String>,
    backend: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            remote: env::var("REPOLINK_REMOTE").ok(),
            backend: env::var("REPOLINK_BACKEND").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(remote: &str, backend: &str) -> Self {
        Self {
            remote: Some(remote.to_owned()),
            backend: Some(backend.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration for the repository rooted at `repo_root` (if any).
    pub fn load(repo_root: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let repo = repo_root.map(|root| root.join(REPO_CONFIG_PATH));
        Self::load_with_layers(global, repo, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        repo: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = vec![Self::from_str(&DEFAULT_CONFIG)?];

        for path in [global, repo].into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config layer");
                layers.push(Self::from_file(&path)?);
            }
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        let (base, overlay) = (self.defaults, other.defaults);
        Self {
            defaults: Defaults {
                remote: overlay.remote.or(base.remote),
                backend: overlay.backend.or(base.backend),
                copy_to_clipboard: overlay.copy_to_clipboard.or(base.copy_to_clipboard),
            },
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("repolink/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    let set = |value: &String| !value.trim().is_empty();
    if let Some(remote) = env.remote.filter(set) {
        config.defaults.remote = Some(remote);
    }
    if let Some(backend) = env.backend.filter(set) {
        let backend = backend
            .parse::<Backend>()
            .context("invalid REPOLINK_BACKEND value")?;
        config.defaults.backend = Some(backend);
    }
    Ok(config)
}
