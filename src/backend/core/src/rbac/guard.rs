//! Declarative permission requirements for gating content.
//!
//! Unlike [`AccessEvaluator::has_all_permissions`](super::AccessEvaluator::has_all_permissions),
//! a guard with an empty list means "no restriction".

use serde::{Deserialize, Serialize};

use super::models::Permission;

/// What a piece of gated content needs from the current user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "permissions", rename_all = "snake_case")]
pub enum PermissionRequirement {
    /// Any present user passes.
    #[default]
    Unrestricted,
    Single(Permission),
    /// At least one of the listed permissions.
    Any(Vec<Permission>),
    /// Every listed permission.
    All(Vec<Permission>),
}

impl PermissionRequirement {
    /// Build from a list, choosing all-of or any-of.
    pub fn from_list(permissions: Vec<Permission>, require_all: bool) -> Self {
        match (permissions.len(), require_all) {
            (0, _) => Self::Unrestricted,
            (_, true) => Self::All(permissions),
            (_, false) => Self::Any(permissions),
        }
    }
}

impl From<Permission> for PermissionRequirement {
    fn from(permission: Permission) -> Self {
        Self::Single(permission)
    }
}
