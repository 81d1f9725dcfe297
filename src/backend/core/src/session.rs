//! Session context: the current user and the organization they are working in.
//!
//! Queries made through a session default their organization scope to the
//! current organization. The session persists itself as an opaque JSON blob;
//! where that blob lives is the host application's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PortalError, Result};
use crate::rbac::{AccessEvaluator, OrganizationId, Permission, PermissionTemplate, User};

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<User>,
    #[serde(default)]
    pub current_organization_id: Option<OrganizationId>,
}

/// Current user plus selected organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    current_organization_id: Option<OrganizationId>,
}

impl Session {
    /// Start a session for `user` in their first organization, if any.
    pub fn for_user(user: User) -> Self {
        let current_organization_id = first_organization(&user);
        Self {
            user: Some(user),
            current_organization_id,
        }
    }

    /// Rebuild a session from a saved blob, falling back to `fallback`.
    ///
    /// A saved user is trusted only if it has an id and a non-empty
    /// `globalRole` tag. An unrecognized tag keeps the saved user with no
    /// global grants. The saved organization is kept only when the user still
    /// belongs to it; otherwise the first membership is selected.
    pub fn restore(saved: Option<&str>, fallback: &User) -> Self {
        let Some(raw) = saved else {
            debug!(user_id = %fallback.id, "No saved session, using fallback user");
            return Self::for_user(fallback.clone());
        };

        let parsed = serde_json::from_str::<Value>(raw).and_then(|value| {
            let has_role_tag = has_global_role_tag(&value);
            serde_json::from_value::<SessionSnapshot>(value).map(|s| (s, has_role_tag))
        });
        let (snapshot, has_role_tag) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable saved session");
                return Self::for_user(fallback.clone());
            }
        };

        match snapshot.user {
            Some(user) if !user.id.as_str().is_empty() && has_role_tag => {
                if user.global_role.is_none() {
                    warn!(
                        user_id = %user.id,
                        "Saved user has an unrecognized global role, granting none"
                    );
                }
                let current_organization_id = snapshot
                    .current_organization_id
                    .filter(|org| user.is_member_of(org))
                    .or_else(|| first_organization(&user));
                info!(user_id = %user.id, org_id = ?current_organization_id, "Restored session");
                Self {
                    user: Some(user),
                    current_organization_id,
                }
            }
            _ => {
                warn!("Saved session has no valid user, using fallback user");
                Self::for_user(fallback.clone())
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            current_organization_id: self.current_organization_id.clone(),
        }
    }

    /// Serialize to the opaque blob accepted by [`restore`](Self::restore).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.snapshot()).map_err(PortalError::Serialization)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn current_organization_id(&self) -> Option<&OrganizationId> {
        self.current_organization_id.as_ref()
    }

    /// Replace the session user (e.g. after their record changed).
    ///
    /// The current organization is re-validated against the new memberships.
    pub fn set_user(&mut self, user: User) {
        if !self
            .current_organization_id
            .as_ref()
            .is_some_and(|org| user.is_member_of(org))
        {
            self.current_organization_id = first_organization(&user);
        }
        self.user = Some(user);
    }

    /// Select another organization. Ignored unless the user belongs to it.
    pub fn switch_organization(&mut self, organization_id: &OrganizationId) -> bool {
        let is_member = self
            .user
            .as_ref()
            .is_some_and(|u| u.is_member_of(organization_id));
        if is_member {
            debug!(org_id = %organization_id, "Switched organization");
            self.current_organization_id = Some(organization_id.clone());
        }
        is_member
    }

    pub fn logout(&mut self) {
        if let Some(user) = &self.user {
            info!(user_id = %user.id, "Session ended");
        }
        self.user = None;
        self.current_organization_id = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scoped queries
    // ─────────────────────────────────────────────────────────────────────────

    fn scope<'a>(
        &'a self,
        organization_id: Option<&'a OrganizationId>,
    ) -> Option<&'a OrganizationId> {
        organization_id.or(self.current_organization_id.as_ref())
    }

    pub fn has_permission(
        &self,
        evaluator: &AccessEvaluator,
        permission: Permission,
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        evaluator.has_permission(self.user(), permission, self.scope(organization_id))
    }

    pub fn has_any_permission(
        &self,
        evaluator: &AccessEvaluator,
        permissions: &[Permission],
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        evaluator.has_any_permission(self.user(), permissions, self.scope(organization_id))
    }

    pub fn has_all_permissions(
        &self,
        evaluator: &AccessEvaluator,
        permissions: &[Permission],
        organization_id: Option<&OrganizationId>,
    ) -> bool {
        evaluator.has_all_permissions(self.user(), permissions, self.scope(organization_id))
    }

    /// Templates the session user's role in `organization_id` may receive.
    pub fn available_templates<'e>(
        &self,
        evaluator: &'e AccessEvaluator,
        organization_id: &OrganizationId,
    ) -> Vec<&'e PermissionTemplate> {
        match self.user().and_then(|u| u.membership(organization_id)) {
            Some(m) => evaluator.applicable_templates(m.role, Some(organization_id)),
            None => Vec::new(),
        }
    }
}

/// Whether the raw blob carries a non-empty `user.globalRole` string,
/// recognized or not.
fn has_global_role_tag(value: &Value) -> bool {
    value
        .pointer("/user/globalRole")
        .and_then(Value::as_str)
        .is_some_and(|tag| !tag.is_empty())
}

fn first_organization(user: &User) -> Option<OrganizationId> {
    user.organization_memberships
        .first()
        .map(|m| m.organization_id.clone())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
