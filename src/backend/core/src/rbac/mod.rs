//! Role-Based Access Control (RBAC) for the organization portal.
//!
//! This module provides:
//! - **Models**: global/organization roles, permissions, users, memberships, templates
//! - **Role Registry**: fixed default permission sets per role
//! - **Template Registry**: reusable permission bundles filtered by role and organization
//! - **Access Evaluator**: layered permission resolution and template application
//! - **Route Guard**: route-level requirements and sidebar navigation filtering
//!
//! # Usage
//!
//! ```rust
//! use orgportal_core::rbac::{AccessEvaluator, OrganizationId, Permission};
//! # use orgportal_core::rbac::{GlobalRole, OrganizationMembership, OrganizationRole, User};
//! # let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! # let role = OrganizationRole::OrgViewer;
//! # let membership = OrganizationMembership::new("1", "TechCorp", role, day);
//! # let user = User::new("4", "Sarah", "sarah@example.com", GlobalRole::User, day)
//! #     .with_membership(membership);
//!
//! let engine = AccessEvaluator::new();
//! let org = OrganizationId::new("1");
//!
//! assert!(engine.has_permission(Some(&user), Permission::OrgView, Some(&org)));
//! assert!(!engine.has_permission(Some(&user), Permission::OrgEdit, Some(&org)));
//! assert!(engine.can_access_route(Some(&user), "/help", None));
//! ```

pub mod guard;
pub mod models;
pub mod policy;
pub mod roles;
pub mod routes;
pub mod templates;

pub use guard::PermissionRequirement;
pub use models::{
    GlobalRole, OrganizationId, OrganizationMembership, OrganizationRole, Permission,
    PermissionScope, PermissionTemplate, RoleDefinition, TemplateId, UnknownTag, User, UserId,
};
pub use policy::{
    has_global_permission, has_organization_permission, AccessDecision, AccessEvaluator,
};
pub use roles::{global_role_definition, organization_role_definition};
pub use routes::{NavigationItem, RouteTable};
pub use templates::{system_templates, TemplateRegistry};
