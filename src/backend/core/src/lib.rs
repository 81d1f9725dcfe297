//! # Orgportal Core
//!
//! Access-control core of a multi-organization management portal.
//!
//! ## Architecture
//!
//! - **RBAC**: global and per-organization roles, permission templates, layered evaluation
//! - **Route Guard**: route requirements and permission-filtered navigation
//! - **Directory**: in-memory user store with authorized role and template mutations
//! - **Session**: current user and organization, persisted as an opaque blob
//! - **Telemetry**: structured logging
//! - **Config**: file and environment configuration

pub mod config;
pub mod directory;
pub mod error;
pub mod rbac;
pub mod session;
pub mod telemetry;

pub use error::{ErrorCode, PortalError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::PortalConfig;
    pub use crate::directory::{AccessDirectory, DirectorySnapshot};
    pub use crate::error::{ErrorCode, PortalError, Result};
    pub use crate::rbac::{
        AccessDecision, AccessEvaluator, GlobalRole, NavigationItem, OrganizationId,
        OrganizationMembership, OrganizationRole, Permission, PermissionRequirement,
        PermissionScope, PermissionTemplate, RoleDefinition, RouteTable, TemplateId,
        TemplateRegistry, User, UserId,
    };
    pub use crate::session::{Session, SessionSnapshot};
}
