//! Configuration management.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Result;
use crate::rbac::{
    AccessEvaluator, OrganizationId, OrganizationRole, Permission, PermissionTemplate, RouteTable,
    TemplateId, TemplateRegistry, UserId,
};
use crate::telemetry::LoggingConfig;

/// Environment variable prefix, e.g. `ORGPORTAL__LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "ORGPORTAL";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// User directory configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Permission template configuration
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Deployment environment (development, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfig {
    /// Path to a JSON/YAML directory snapshot
    pub path: Option<String>,

    /// User to fall back to when no session can be restored
    pub default_user_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatesConfig {
    /// User-defined templates appended after the system catalog
    #[serde(default)]
    pub custom: Vec<CustomTemplateConfig>,
}

/// A user-defined template as written in a config file.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomTemplateConfig {
    /// Generated when omitted
    pub id: Option<TemplateId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub permissions: Vec<Permission>,
    pub applicable_roles: Vec<OrganizationRole>,
    /// Restricts the template to one organization
    pub organization_id: Option<OrganizationId>,
    pub created_by: Option<UserId>,
    pub created_at: NaiveDate,
}

impl CustomTemplateConfig {
    pub fn to_template(&self) -> PermissionTemplate {
        PermissionTemplate {
            id: self.id.clone().unwrap_or_else(TemplateId::generate),
            name: self.name.clone(),
            description: self.description.clone(),
            permissions: self.permissions.clone(),
            applicable_roles: self.applicable_roles.clone(),
            is_system: false,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            organization_id: self.organization_id.clone(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

impl PortalConfig {
    /// Load configuration from the environment only.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: PortalConfig = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: PortalConfig = config.try_deserialize()?;
        Ok(cfg)
    }

    /// System templates followed by the configured custom ones.
    pub fn template_registry(&self) -> TemplateRegistry {
        let custom = self.templates.custom.iter().map(CustomTemplateConfig::to_template);
        TemplateRegistry::system().with_templates(custom)
    }

    /// An evaluator over this configuration's registries.
    pub fn evaluator(&self) -> AccessEvaluator {
        AccessEvaluator::with_registries(self.template_registry(), RouteTable::default())
    }
}
