//! In-memory user directory with authorized role and template management.
//!
//! The directory answers "who may change whose access": each mutation first
//! checks the acting user with the [`AccessEvaluator`], then replaces the
//! stored record with the value produced by the evaluator's pure functions.
//!
//! | Operation                    | Actor needs            | Scope        |
//! |------------------------------|------------------------|--------------|
//! | `update_global_role`         | `users.manage_global`  | global       |
//! | `update_organization_role`   | `org.members.manage`   | organization |
//! | `apply_permission_template`  | `org.members.manage`   | organization |
//! | `remove_permission_template` | `org.members.manage`   | organization |

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{PortalError, Result};
use crate::rbac::{
    AccessEvaluator, GlobalRole, OrganizationId, OrganizationMembership, OrganizationRole,
    Permission, PermissionTemplate, TemplateId, User, UserId,
};

/// Serializable form of the whole directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub users: Vec<User>,
}

/// Thread-safe user store plus the evaluator that guards it.
#[derive(Debug, Clone)]
pub struct AccessDirectory {
    users: Arc<DashMap<UserId, User>>,
    evaluator: AccessEvaluator,
}

impl AccessDirectory {
    pub fn new(evaluator: AccessEvaluator) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            evaluator,
        }
    }

    pub fn from_users(evaluator: AccessEvaluator, users: impl IntoIterator<Item = User>) -> Self {
        let dir = Self::new(evaluator);
        for user in users {
            dir.insert_user(user);
        }
        dir
    }

    pub fn from_snapshot(evaluator: AccessEvaluator, snapshot: DirectorySnapshot) -> Self {
        Self::from_users(evaluator, snapshot.users)
    }

    /// Parse a JSON snapshot.
    pub fn from_json(evaluator: AccessEvaluator, json: &str) -> Result<Self> {
        let snapshot: DirectorySnapshot =
            serde_json::from_str(json).map_err(PortalError::Deserialization)?;
        Ok(Self::from_snapshot(evaluator, snapshot))
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot { users: self.users() }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(PortalError::Serialization)
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace a user.
    pub fn insert_user(&self, user: User) {
        debug!(user_id = %user.id, "Adding user to directory");
        self.users.insert(user.id.clone(), user);
    }

    pub fn get_user(&self, user_id: &UserId) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    /// Like [`get_user`](Self::get_user) but missing users are an error.
    pub fn require_user(&self, user_id: &UserId) -> Result<User> {
        self.get_user(user_id)
            .ok_or_else(|| PortalError::UserNotFound(user_id.clone()))
    }

    /// All users, ordered by id.
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorized mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Change a user's global role. Returns `Ok(false)` if the target is unknown.
    pub fn update_global_role(
        &self,
        actor: &UserId,
        target: &UserId,
        role: GlobalRole,
    ) -> Result<bool> {
        self.authorize(actor, Permission::UsersManageGlobal, None)?;

        let Some(mut user) = self.users.get_mut(target) else {
            debug!(target_id = %target, "Global role update skipped: no such user");
            return Ok(false);
        };
        user.global_role = Some(role);
        info!(actor_id = %actor, target_id = %target, role = %role, "Updated global role");
        Ok(true)
    }

    /// Change a user's role within one organization.
    pub fn update_organization_role(
        &self,
        actor: &UserId,
        target: &UserId,
        organization_id: &OrganizationId,
        role: OrganizationRole,
    ) -> Result<bool> {
        self.authorize(actor, Permission::OrgMembersManage, Some(organization_id))?;

        let updated = self.update_membership(target, organization_id, |m| OrganizationMembership {
            role: Some(role),
            ..m.clone()
        });
        if updated {
            info!(
                actor_id = %actor,
                target_id = %target,
                org_id = %organization_id,
                role = %role,
                "Updated organization role"
            );
        }
        Ok(updated)
    }

    /// Merge a template's permissions into the target's membership overlay.
    pub fn apply_permission_template(
        &self,
        actor: &UserId,
        target: &UserId,
        organization_id: &OrganizationId,
        template_id: &TemplateId,
    ) -> Result<bool> {
        let template = self.authorized_template(actor, organization_id, template_id)?;
        let updated = self.update_membership(target, organization_id, |m| {
            self.evaluator.apply_template(m, Some(&template))
        });
        if updated {
            info!(
                actor_id = %actor,
                target_id = %target,
                org_id = %organization_id,
                template_id = %template_id,
                "Applied permission template"
            );
        }
        Ok(updated)
    }

    /// Strip a template's permissions from the target's membership overlay.
    pub fn remove_permission_template(
        &self,
        actor: &UserId,
        target: &UserId,
        organization_id: &OrganizationId,
        template_id: &TemplateId,
    ) -> Result<bool> {
        let template = self.authorized_template(actor, organization_id, template_id)?;
        let updated = self.update_membership(target, organization_id, |m| {
            self.evaluator.remove_template(m, Some(&template))
        });
        if updated {
            info!(
                actor_id = %actor,
                target_id = %target,
                org_id = %organization_id,
                template_id = %template_id,
                "Removed permission template"
            );
        }
        Ok(updated)
    }

    /// Templates the user's role in `organization_id` may receive.
    pub fn available_templates(
        &self,
        user_id: &UserId,
        organization_id: &OrganizationId,
    ) -> Vec<PermissionTemplate> {
        let Some(user) = self.users.get(user_id) else {
            return Vec::new();
        };
        let Some(membership) = user.membership(organization_id) else {
            return Vec::new();
        };
        self.evaluator
            .applicable_templates(membership.role, Some(organization_id))
            .into_iter()
            .cloned()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn authorize(
        &self,
        actor: &UserId,
        permission: Permission,
        organization_id: Option<&OrganizationId>,
    ) -> Result<()> {
        let actor_user = self.get_user(actor);
        if self
            .evaluator
            .has_permission(actor_user.as_ref(), permission, organization_id)
        {
            Ok(())
        } else {
            let err = PortalError::insufficient(actor, permission, organization_id);
            err.log();
            Err(err)
        }
    }

    fn authorized_template(
        &self,
        actor: &UserId,
        organization_id: &OrganizationId,
        template_id: &TemplateId,
    ) -> Result<PermissionTemplate> {
        self.authorize(actor, Permission::OrgMembersManage, Some(organization_id))?;
        self.evaluator
            .templates()
            .get(template_id)
            .filter(|t| t.visible_in(Some(organization_id)))
            .cloned()
            .ok_or_else(|| PortalError::TemplateNotFound(template_id.clone()))
    }

    /// Replace the target's membership in `organization_id` with `f(current)`.
    fn update_membership<F>(&self, target: &UserId, organization_id: &OrganizationId, f: F) -> bool
    where
        F: FnOnce(&OrganizationMembership) -> OrganizationMembership,
    {
        let Some(mut user) = self.users.get_mut(target) else {
            debug!(target_id = %target, "Membership update skipped: no such user");
            return false;
        };
        let Some(slot) = user
            .organization_memberships
            .iter_mut()
            .find(|m| &m.organization_id == organization_id)
        else {
            debug!(
                target_id = %target,
                org_id = %organization_id,
                "Membership update skipped: not a member"
            );
            return false;
        };
        *slot = f(slot);
        true
    }
}

impl Default for AccessDirectory {
    fn default() -> Self {
        Self::new(AccessEvaluator::new())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn setup() -> AccessDirectory {
        let admin = User::new("1", "John Doe", "john@example.com", GlobalRole::SuperAdmin, date())
            .with_membership(OrganizationMembership::new(
                "1",
                "TechCorp",
                OrganizationRole::OrgAdmin,
                date(),
            ));
        let manager = User::new("2", "Jane Smith", "jane@example.com", GlobalRole::Admin, date())
            .with_membership(OrganizationMembership::new(
                "1",
                "TechCorp",
                OrganizationRole::OrgManager,
                date(),
            ));
        let viewer = User::new("4", "Sarah Wilson", "sarah@example.com", GlobalRole::User, date())
            .with_membership(OrganizationMembership::new(
                "1",
                "TechCorp",
                OrganizationRole::OrgViewer,
                date(),
            ));
        AccessDirectory::from_users(AccessEvaluator::new(), [admin, manager, viewer])
    }

    fn id(s: &str) -> UserId {
        UserId::new(s)
    }

    fn org1() -> OrganizationId {
        OrganizationId::new("1")
    }

    #[test]
    fn test_users_sorted() {
        let dir = setup();
        let ids: Vec<_> = dir.users().into_iter().map(|u| u.id.0).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(dir.len(), 3);
    }

    #[test]
    fn test_update_global_role_requires_manage_global() {
        let dir = setup();
        let err = dir
            .update_global_role(&id("4"), &id("2"), GlobalRole::User)
            .unwrap_err();
        assert!(matches!(err, PortalError::InsufficientPermissions { .. }));

        assert!(dir.update_global_role(&id("2"), &id("4"), GlobalRole::Admin).unwrap());
        assert_eq!(dir.get_user(&id("4")).unwrap().global_role, Some(GlobalRole::Admin));
    }

    #[test]
    fn test_unknown_target_is_noop() {
        let dir = setup();
        assert!(!dir.update_global_role(&id("1"), &id("99"), GlobalRole::User).unwrap());
        assert!(!dir
            .update_organization_role(&id("1"), &id("99"), &org1(), OrganizationRole::OrgMember)
            .unwrap());
    }

    #[test]
    fn test_unknown_actor_is_denied() {
        let dir = setup();
        let err = dir
            .update_global_role(&id("ghost"), &id("4"), GlobalRole::Admin)
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_org_manager_cannot_manage_members() {
        let dir = setup();
        let err = dir
            .update_organization_role(&id("2"), &id("4"), &org1(), OrganizationRole::OrgMember)
            .unwrap_err();
        assert!(matches!(err, PortalError::InsufficientPermissions { .. }));
    }

    #[test]
    fn test_apply_and_remove_template() {
        let dir = setup();
        let tpl = TemplateId::new("template-analytics-viewer");

        assert!(dir.apply_permission_template(&id("1"), &id("4"), &org1(), &tpl).unwrap());
        let m = dir.get_user(&id("4")).unwrap().membership(&org1()).cloned().unwrap();
        assert_eq!(m.permissions, vec![Permission::OrgView, Permission::OrgAnalyticsView]);

        assert!(dir.remove_permission_template(&id("1"), &id("4"), &org1(), &tpl).unwrap());
        let m = dir.get_user(&id("4")).unwrap().membership(&org1()).cloned().unwrap();
        assert!(m.permissions.is_empty());
    }

    #[test]
    fn test_unknown_template_after_authorization() {
        let dir = setup();
        let missing = TemplateId::new("template-missing");

        let err = dir
            .apply_permission_template(&id("1"), &id("4"), &org1(), &missing)
            .unwrap_err();
        assert!(matches!(err, PortalError::TemplateNotFound(_)));

        // an unauthorized actor hears about permissions, not the template
        let err = dir
            .apply_permission_template(&id("4"), &id("4"), &org1(), &missing)
            .unwrap_err();
        assert!(matches!(err, PortalError::InsufficientPermissions { .. }));
    }

    #[test]
    fn test_available_templates() {
        let dir = setup();
        let names: Vec<_> = dir
            .available_templates(&id("4"), &org1())
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Analytics Viewer", "Read Only"]);
        assert!(dir.available_templates(&id("4"), &OrganizationId::new("2")).is_empty());
        assert!(dir.available_templates(&id("99"), &org1()).is_empty());
    }

    #[test]
    fn test_json_snapshot() {
        let dir = setup();
        let json = dir.to_json().unwrap();
        let restored = AccessDirectory::from_json(AccessEvaluator::new(), &json).unwrap();
        assert_eq!(restored.snapshot(), dir.snapshot());

        let err = AccessDirectory::from_json(AccessEvaluator::new(), "{not json").unwrap_err();
        assert!(matches!(err, PortalError::Deserialization(_)));
    }
}
