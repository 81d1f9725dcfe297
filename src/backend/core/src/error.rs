//! Error handling for the portal core.
//!
//! Permission queries never fail; they answer `false`. Errors exist for the
//! operations around them: authorized directory mutations, session
//! persistence and configuration loading.
//!
//! # Usage
//!
//! ```rust,ignore
//! use orgportal_core::error::{PortalError, Result};
//!
//! fn promote(dir: &AccessDirectory, actor: &UserId, target: &UserId) -> Result<()> {
//!     dir.update_global_role(actor, target, GlobalRole::Admin)?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::rbac::{OrganizationId, Permission, TemplateId, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for portal operations.
pub type Result<T> = std::result::Result<T, PortalError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// These codes are stable and can be used by callers for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Serialization Errors (2200-2299)
    SerializationError,
    DeserializationError,

    // Authorization (4000-4099)
    Forbidden,
    InsufficientPermissions,

    // Lookup (4040-4049)
    UserNotFound,
    TemplateNotFound,

    // Configuration Errors (5000-5099)
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::SerializationError => 2200,
            Self::DeserializationError => 2201,

            Self::Forbidden => 4001,
            Self::InsufficientPermissions => 4002,

            Self::UserNotFound => 4040,
            Self::TemplateNotFound => 4041,

            Self::ConfigurationError => 5000,
        }
    }

    /// Errors caused by the caller's input rather than the environment.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Forbidden
                | Self::InsufficientPermissions
                | Self::UserNotFound
                | Self::TemplateNotFound
                | Self::DeserializationError
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Portal Error
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors raised by the portal core.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error(
        "Insufficient permissions: user {actor} lacks {permission}{}",
        scope_suffix(.organization_id)
    )]
    InsufficientPermissions {
        actor: UserId,
        permission: Permission,
        organization_id: Option<OrganizationId>,
    },

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Failed to serialize: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Failed to deserialize: {0}")]
    Deserialization(#[source] serde_json::Error),
}

fn scope_suffix(organization_id: &Option<OrganizationId>) -> String {
    organization_id
        .as_ref()
        .map(|org| format!(" in organization {org}"))
        .unwrap_or_default()
}

impl PortalError {
    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied(_) => ErrorCode::Forbidden,
            Self::InsufficientPermissions { .. } => ErrorCode::InsufficientPermissions,
            Self::UserNotFound(_) => ErrorCode::UserNotFound,
            Self::TemplateNotFound(_) => ErrorCode::TemplateNotFound,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
            Self::Serialization(_) => ErrorCode::SerializationError,
            Self::Deserialization(_) => ErrorCode::DeserializationError,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }

    /// Log this error at a level matching who caused it.
    pub fn log(&self) {
        let code = self.code();
        if code.is_client_error() {
            warn!(code = ?code, numeric_code = code.numeric_code(), "{}", self);
        } else {
            error!(code = ?code, numeric_code = code.numeric_code(), "{}", self);
        }
    }

    pub fn insufficient(
        actor: &UserId,
        permission: Permission,
        organization_id: Option<&OrganizationId>,
    ) -> Self {
        Self::InsufficientPermissions {
            actor: actor.clone(),
            permission,
            organization_id: organization_id.cloned(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
