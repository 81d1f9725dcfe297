//! The directory file and portal configuration a command runs against.
//!
//! Directory files are JSON unless the extension says YAML. Mutating
//! commands write the whole snapshot back in the same format.

use anyhow::{bail, Context, Result};
use orgportal_core::config::PortalConfig;
use orgportal_core::directory::{AccessDirectory, DirectorySnapshot};
use orgportal_core::rbac::{AccessEvaluator, User, UserId};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::commands::config::CliConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

pub struct Workspace {
    pub config: PortalConfig,
    directory: AccessDirectory,
    directory_path: Option<PathBuf>,
}

impl Workspace {
    /// Open the directory named by the flag, the portal config or the CLI config, in that order.
    ///
    /// With no directory file at all the workspace starts empty.
    pub fn open(config: PortalConfig, directory_flag: Option<PathBuf>) -> Result<Self> {
        let directory_path = directory_flag
            .or_else(|| config.directory.path.as_ref().map(PathBuf::from))
            .or_else(|| CliConfig::load().directory);

        let evaluator = config.evaluator();
        let directory = match &directory_path {
            Some(path) => {
                let snapshot = read_snapshot(path)?;
                debug!(path = %path.display(), users = snapshot.users.len(), "Loaded directory");
                AccessDirectory::from_snapshot(evaluator, snapshot)
            }
            None => {
                debug!("No directory file configured, starting empty");
                AccessDirectory::new(evaluator)
            }
        };

        Ok(Self {
            config,
            directory,
            directory_path,
        })
    }

    pub fn directory(&self) -> &AccessDirectory {
        &self.directory
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        self.directory.evaluator()
    }

    /// Resolve the user a command acts as or inspects.
    ///
    /// Falls back to the configured default user.
    pub fn user(&self, id: Option<&str>) -> Result<User> {
        let id = match id {
            Some(id) => UserId::new(id),
            None => match self
                .config
                .directory
                .default_user_id
                .clone()
                .or_else(|| CliConfig::load().user)
            {
                Some(id) => id,
                None => bail!("No user given and no default user configured (use --user)"),
            },
        };
        Ok(self.directory.require_user(&id)?)
    }

    /// Write the directory back to the file it came from.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.directory_path else {
            bail!("No directory file to save to (use --directory)");
        };
        write_snapshot(path, &self.directory.snapshot())?;
        info!(path = %path.display(), "Saved directory");
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<DirectorySnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = match FileFormat::of(path) {
        FileFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        FileFormat::Yaml => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
    };
    Ok(snapshot)
}

fn write_snapshot(path: &Path, snapshot: &DirectorySnapshot) -> Result<()> {
    let content = match FileFormat::of(path) {
        FileFormat::Json => serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize directory")?,
        FileFormat::Yaml => {
            serde_yaml::to_string(snapshot).context("Failed to serialize directory")?
        }
    };
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgportal_core::rbac::GlobalRole;

    const DEMO: &str = include_str!("../../../demos/directory.json");

    fn demo_file(ext: &str) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(ext).tempfile().unwrap();
        let snapshot: DirectorySnapshot = serde_json::from_str(DEMO).unwrap();
        write_snapshot(file.path(), &snapshot).unwrap();
        file
    }

    #[test]
    fn test_open_json_and_resolve_user() {
        let file = demo_file(".json");
        let ws = Workspace::open(PortalConfig::default(), Some(file.path().to_path_buf())).unwrap();
        assert_eq!(ws.directory().len(), 4);
        assert_eq!(ws.user(Some("2")).unwrap().name, "Jane Smith");
        assert!(ws.user(Some("99")).is_err());
    }

    #[test]
    fn test_yaml_round_trip_through_save() {
        let file = demo_file(".yaml");
        let ws = Workspace::open(PortalConfig::default(), Some(file.path().to_path_buf())).unwrap();
        ws.directory()
            .update_global_role(&UserId::new("1"), &UserId::new("4"), GlobalRole::Admin)
            .unwrap();
        ws.save().unwrap();

        let reopened =
            Workspace::open(PortalConfig::default(), Some(file.path().to_path_buf())).unwrap();
        assert_eq!(reopened.user(Some("4")).unwrap().global_role, Some(GlobalRole::Admin));
    }

    #[test]
    fn test_default_user_from_portal_config() {
        let file = demo_file(".json");
        let mut config = PortalConfig::default();
        config.directory.default_user_id = Some(UserId::new("3"));
        let ws = Workspace::open(config, Some(file.path().to_path_buf())).unwrap();
        assert_eq!(ws.user(None).unwrap().name, "Mike Johnson");
    }
}
