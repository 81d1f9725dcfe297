//! CLI defaults stored in `~/.orgportal/config.toml`.
//!
//! Two settings exist: the directory file to open and the user commands act
//! as when `--user`/`--as` is omitted.

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use orgportal_core::rbac::UserId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set a default
    Set {
        key: ConfigKey,
        value: String,
    },

    /// Print a default
    Get {
        key: ConfigKey,
    },

    /// Show all defaults
    Show,

    /// Remove the config file
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Directory file (JSON or YAML)
    Directory,
    /// Default acting user ID
    User,
}

/// Persistent CLI defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
}

impl CliConfig {
    /// Defaults from the home config file; missing or unreadable means none.
    pub fn load() -> Self {
        config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) {
        match key {
            ConfigKey::Directory => self.directory = Some(PathBuf::from(value)),
            ConfigKey::User => self.user = Some(UserId::new(value)),
        }
    }

    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::Directory => self.directory.as_ref().map(|p| p.display().to_string()),
            ConfigKey::User => self.user.as_ref().map(|u| u.to_string()),
        }
    }

    fn is_empty(&self) -> bool {
        self.directory.is_none() && self.user.is_none()
    }
}

fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".orgportal").join("config.toml"))
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Directory => "directory",
        ConfigKey::User => "user",
    }
}

pub fn execute(cmd: ConfigCommands, format: OutputFormat) -> Result<()> {
    let path = config_path()?;
    match cmd {
        ConfigCommands::Set { key, value } => {
            let mut cfg = CliConfig::load_from(&path)?;
            cfg.set(key, &value);
            cfg.save_to(&path)?;
            output::print_success(&format!("{} = {}", key_name(key), value));
        }

        ConfigCommands::Get { key } => {
            let cfg = CliConfig::load_from(&path)?;
            let value = cfg
                .get(key)
                .with_context(|| format!("'{}' is not set", key_name(key)))?;
            println!("{}", value);
        }

        ConfigCommands::Show => {
            let cfg = CliConfig::load_from(&path)?;
            if cfg.is_empty() {
                output::print_info("No defaults set.");
                return Ok(());
            }
            match format {
                OutputFormat::Table => {
                    output::print_header("Defaults");
                    for key in [ConfigKey::Directory, ConfigKey::User] {
                        if let Some(value) = cfg.get(key) {
                            output::print_detail(key_name(key), &value);
                        }
                    }
                }
                _ => output::print_item(&cfg, format)?,
            }
        }

        ConfigCommands::Reset { force } => {
            if !force {
                output::print_info("This removes all CLI defaults. Use --force to confirm.");
                return Ok(());
            }
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            output::print_success("Defaults removed");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_typed_keys() {
        let mut cfg = CliConfig::default();
        assert_eq!(cfg.get(ConfigKey::User), None);

        cfg.set(ConfigKey::User, "3");
        cfg.set(ConfigKey::Directory, "demos/directory.json");
        assert_eq!(cfg.user, Some(UserId::new("3")));
        assert_eq!(cfg.get(ConfigKey::Directory).as_deref(), Some("demos/directory.json"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(ConfigKey::from_str("api-url", true).is_err());
        assert_eq!(ConfigKey::from_str("user", true), Ok(ConfigKey::User));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".orgportal").join("config.toml");
        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());

        let mut cfg = CliConfig::default();
        cfg.set(ConfigKey::User, "4");
        cfg.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("user = \"4\""));
        assert_eq!(CliConfig::load_from(&path).unwrap(), cfg);
    }
}
