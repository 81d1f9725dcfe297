//! Access evaluator: answers permission queries and rewrites membership overlays.
//!
//! The evaluator answers the question:
//! "Does user U hold permission P, optionally within organization O?"
//!
//! Resolution is layered:
//!
//! ```text
//! has_permission(user, p, org)
//!   ├─ global role defaults contain p?           → granted (org scope ignored)
//!   └─ org given → membership for org
//!        ├─ custom overlay contains p?           → granted
//!        └─ org role defaults contain p?         → granted / denied
//! ```
//!
//! Every query is fail-closed: an absent user, membership or role, or an
//! empty requirement list, answers `false`. Nothing here returns an error or
//! panics on bad input.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

use super::guard::PermissionRequirement;
use super::models::{
    GlobalRole, OrganizationId, OrganizationMembership, OrganizationRole, Permission,
    PermissionTemplate, User,
};
use super::roles::{global_role_definition, organization_role_definition};
use super::routes::{NavigationItem, RouteTable};
use super::templates::TemplateRegistry;
use crate::error::{PortalError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of an evaluation that carries a reason when denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The permission is granted.
    Allow,
    /// The permission is denied, with a reason.
    Deny(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role-level checks
// ═══════════════════════════════════════════════════════════════════════════════

/// True iff `role` is present and its default permissions contain `permission`.
pub fn has_global_permission(role: Option<GlobalRole>, permission: Permission) -> bool {
    global_role_definition(role).is_some_and(|def| def.grants(permission))
}

/// Overlay first, then the membership role's defaults.
///
/// The overlay is strictly additive: it can grant beyond the role, never revoke.
pub fn has_organization_permission(
    membership: Option<&OrganizationMembership>,
    permission: Permission,
) -> bool {
    let Some(membership) = membership else {
        return false;
    };
    if membership.permissions.contains(&permission) {
        trace!(org_id = %membership.organization_id, %permission, "Granted by custom overlay");
        return true;
    }
    organization_role_definition(membership.role).is_some_and(|def| def.grants(permission))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Access Evaluator
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateless evaluator over the immutable role, template and route registries.
///
/// Cheap to clone; registries are shared behind `Arc` and never mutated, so
/// one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    templates: Arc<TemplateRegistry>,
    routes: Arc<RouteTable>,
}

impl AccessEvaluator {
    /// Evaluator over the system templates and the reference route table.
    pub fn new() -> Self {
        Self::with_registries(TemplateRegistry::system(), RouteTable::default())
    }

    pub fn with_registries(templates: TemplateRegistry, routes: RouteTable) -> Self {
        Self {
            templates: Arc::new(templates),
            routes: Arc::new(routes),
        }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn has_global_permission(&self, role: Option<GlobalRole>, permission: Permission) -> bool {
        has_global_permission(role, permission)
    }

    pub fn has_organization_permission(
        &self,
        membership: Option<&OrganizationMembership>,
        permission: Permission,
    ) -> bool {
        has_organization_permission(membership, permission)
    }

    /// Global role first; a sufficient global role wins regardless of scope.
    ///
    /// Without an organization, organization-scoped permissions are never granted.
    pub fn has_permission(
        &self,
        user: Option<&User>,
        permission: Permission,
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        let Some(user) = user else {
            return false;
        };

        if has_global_permission(user.global_role, permission) {
            debug!(user_id = %user.id, %permission, "Permission granted by global role");
            return true;
        }

        let Some(org_id) = organization_id else {
            trace!(user_id = %user.id, %permission, "No organization context");
            return false;
        };

        let granted = has_organization_permission(user.membership(org_id), permission);
        debug!(
            user_id = %user.id,
            %permission,
            org_id = %org_id,
            granted,
            "Organization permission check"
        );
        granted
    }

    /// True if at least one permission holds. An empty list is `false`.
    pub fn has_any_permission(
        &self,
        user: Option<&User>,
        permissions: &[Permission],
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        if user.is_none() || permissions.is_empty() {
            return false;
        }
        permissions
            .iter()
            .any(|p| self.has_permission(user, *p, organization_id))
    }

    /// True if every permission holds. An empty list is `false`, not vacuously true.
    pub fn has_all_permissions(
        &self,
        user: Option<&User>,
        permissions: &[Permission],
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        if user.is_none() || permissions.is_empty() {
            return false;
        }
        permissions
            .iter()
            .all(|p| self.has_permission(user, *p, organization_id))
    }

    /// The user's role in `organization_id`, if they belong to it.
    pub fn user_organization_role(
        &self,
        user: Option<&User>,
        organization_id: &OrganizationId,
    ) -> Option<OrganizationRole> {
        user?.membership(organization_id)?.role
    }

    /// Overlay ∪ role defaults, for display.
    pub fn effective_permissions(
        &self,
        membership: &OrganizationMembership,
    ) -> BTreeSet<Permission> {
        let mut perms: BTreeSet<Permission> = membership.permissions.iter().copied().collect();
        if let Some(def) = organization_role_definition(membership.role) {
            perms.extend(def.permissions.iter().copied());
        }
        perms
    }

    /// `has_permission` with a reason attached to denials.
    pub fn check(
        &self,
        user: Option<&User>,
        permission: Permission,
        organization_id: Option<&OrganizationId>,
    ) -> AccessDecision {
        if self.has_permission(user, permission, organization_id) {
            return AccessDecision::Allow;
        }
        let reason = match (user, organization_id) {
            (None, _) => "No user in context".to_string(),
            (Some(u), None) => {
                format!("User {} does not have global permission {}", u.id, permission)
            }
            (Some(u), Some(org)) if !u.is_member_of(org) => {
                format!("User {} is not a member of organization {}", u.id, org)
            }
            (Some(u), Some(org)) => format!(
                "User {} does not have permission {} in organization {}",
                u.id, permission, org
            ),
        };
        AccessDecision::Deny(reason)
    }

    /// Convenience: `Ok(())` if allowed, `Err(PortalError::PermissionDenied)` otherwise.
    pub fn enforce(
        &self,
        user: Option<&User>,
        permission: Permission,
        organization_id: Option<&OrganizationId>,
    ) -> Result<()> {
        match self.check(user, permission, organization_id) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(PortalError::PermissionDenied(reason)),
        }
    }

    /// Evaluate a guard requirement.
    pub fn satisfies(
        &self,
        user: Option<&User>,
        requirement: &PermissionRequirement,
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        if user.is_none() {
            return false;
        }
        match requirement {
            PermissionRequirement::Unrestricted => true,
            PermissionRequirement::Single(p) => self.has_permission(user, *p, organization_id),
            PermissionRequirement::Any(ps) if ps.is_empty() => true,
            PermissionRequirement::All(ps) if ps.is_empty() => true,
            PermissionRequirement::Any(ps) => self.has_any_permission(user, ps, organization_id),
            PermissionRequirement::All(ps) => self.has_all_permissions(user, ps, organization_id),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Routes
    // ─────────────────────────────────────────────────────────────────────────

    /// Routes with no (or no listed) requirement are open to any present user.
    pub fn can_access_route(
        &self,
        user: Option<&User>,
        route: &str,
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        if user.is_none() {
            return false;
        }
        let required = self.routes.required_permissions(route);
        if required.is_empty() {
            return true;
        }
        self.has_any_permission(user, required, organization_id)
    }

    /// Navigation entries the user may see in `organization_id`.
    pub fn visible_navigation(
        &self,
        user: Option<&User>,
        organization_id: Option<&OrganizationId>,
    ) -> Vec<&NavigationItem> {
        if user.is_none() {
            return Vec::new();
        }
        self.routes
            .navigation()
            .iter()
            .filter(|item| {
                item.permissions.is_empty()
                    || self.has_any_permission(user, &item.permissions, organization_id)
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Templates
    // ─────────────────────────────────────────────────────────────────────────

    pub fn applicable_templates(
        &self,
        role: Option<OrganizationRole>,
        organization_id: Option<&OrganizationId>,
    ) -> Vec<&PermissionTemplate> {
        self.templates.applicable_templates(role, organization_id)
    }

    /// New membership whose overlay is `current ∪ template`, first-seen order kept.
    ///
    /// An absent template returns the membership unchanged.
    pub fn apply_template(
        &self,
        membership: &OrganizationMembership,
        template: Option<&PermissionTemplate>,
    ) -> OrganizationMembership {
        let Some(template) = template else {
            return membership.clone();
        };

        let mut permissions =
            Vec::with_capacity(membership.permissions.len() + template.permissions.len());
        for p in membership.permissions.iter().chain(&template.permissions) {
            if !permissions.contains(p) {
                permissions.push(*p);
            }
        }

        debug!(
            org_id = %membership.organization_id,
            template_id = %template.id,
            before = membership.permissions.len(),
            after = permissions.len(),
            "Applied permission template"
        );

        OrganizationMembership {
            permissions,
            ..membership.clone()
        }
    }

    /// New membership whose overlay is `current − template`.
    ///
    /// Only the overlay is touched: role defaults that coincide with the
    /// template stay granted, and overlay entries that predate the template are
    /// stripped too, so this is not an inverse of `apply_template`.
    pub fn remove_template(
        &self,
        membership: &OrganizationMembership,
        template: Option<&PermissionTemplate>,
    ) -> OrganizationMembership {
        let Some(template) = template else {
            return membership.clone();
        };

        let permissions: Vec<Permission> = membership
            .permissions
            .iter()
            .copied()
            .filter(|p| !template.permissions.contains(p))
            .collect();

        debug!(
            org_id = %membership.organization_id,
            template_id = %template.id,
            before = membership.permissions.len(),
            after = permissions.len(),
            "Removed permission template"
        );

        OrganizationMembership {
            permissions,
            ..membership.clone()
        }
    }
}

impl Default for AccessEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
