//! RBAC data models: roles, permissions, users, memberships, and templates.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Strongly-typed organization identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrganizationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrganizationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Strongly-typed permission template identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier for a user-defined template.
    pub fn generate() -> Self {
        Self(format!("template-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TemplateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Roles
// ═══════════════════════════════════════════════════════════════════════════════

/// Platform-wide role, independent of any organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    SuperAdmin,
    Admin,
    User,
}

impl GlobalRole {
    pub const ALL: [GlobalRole; 3] = [Self::SuperAdmin, Self::Admin, Self::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlobalRole {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownTag::new("global role", s))
    }
}

/// Role scoped to a single organization membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    OrgAdmin,
    OrgManager,
    OrgMember,
    OrgViewer,
}

impl OrganizationRole {
    pub const ALL: [OrganizationRole; 4] = [
        Self::OrgAdmin,
        Self::OrgManager,
        Self::OrgMember,
        Self::OrgViewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrgAdmin => "org_admin",
            Self::OrgManager => "org_manager",
            Self::OrgMember => "org_member",
            Self::OrgViewer => "org_viewer",
        }
    }
}

impl fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizationRole {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownTag::new("organization role", s))
    }
}

/// Returned when parsing a role or permission tag outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownTag {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// Naming-convention partition of permissions.
///
/// Nothing in the evaluator enforces this; it exists for display and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    Global,
    Organization,
}

/// Atomic named capability.
///
/// Serialized as the dotted tag, e.g. `"org.members.manage"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "system.manage")]
    SystemManage,
    #[serde(rename = "users.manage_global")]
    UsersManageGlobal,
    #[serde(rename = "organizations.create")]
    OrganizationsCreate,
    #[serde(rename = "organizations.view_all")]
    OrganizationsViewAll,
    #[serde(rename = "templates.manage_global")]
    TemplatesManageGlobal,

    #[serde(rename = "org.manage")]
    OrgManage,
    #[serde(rename = "org.edit")]
    OrgEdit,
    #[serde(rename = "org.delete")]
    OrgDelete,
    #[serde(rename = "org.view")]
    OrgView,
    #[serde(rename = "org.share")]
    OrgShare,
    #[serde(rename = "org.export")]
    OrgExport,
    #[serde(rename = "org.members.invite")]
    OrgMembersInvite,
    #[serde(rename = "org.members.manage")]
    OrgMembersManage,
    #[serde(rename = "org.members.remove")]
    OrgMembersRemove,
    #[serde(rename = "org.analytics.view")]
    OrgAnalyticsView,
    #[serde(rename = "org.analytics.export")]
    OrgAnalyticsExport,
    #[serde(rename = "org.settings.manage")]
    OrgSettingsManage,
    #[serde(rename = "org.templates.create")]
    OrgTemplatesCreate,
    #[serde(rename = "org.templates.edit")]
    OrgTemplatesEdit,
    #[serde(rename = "org.templates.delete")]
    OrgTemplatesDelete,
}

impl Permission {
    pub const ALL: [Permission; 20] = [
        Self::SystemManage,
        Self::UsersManageGlobal,
        Self::OrganizationsCreate,
        Self::OrganizationsViewAll,
        Self::TemplatesManageGlobal,
        Self::OrgManage,
        Self::OrgEdit,
        Self::OrgDelete,
        Self::OrgView,
        Self::OrgShare,
        Self::OrgExport,
        Self::OrgMembersInvite,
        Self::OrgMembersManage,
        Self::OrgMembersRemove,
        Self::OrgAnalyticsView,
        Self::OrgAnalyticsExport,
        Self::OrgSettingsManage,
        Self::OrgTemplatesCreate,
        Self::OrgTemplatesEdit,
        Self::OrgTemplatesDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemManage => "system.manage",
            Self::UsersManageGlobal => "users.manage_global",
            Self::OrganizationsCreate => "organizations.create",
            Self::OrganizationsViewAll => "organizations.view_all",
            Self::TemplatesManageGlobal => "templates.manage_global",
            Self::OrgManage => "org.manage",
            Self::OrgEdit => "org.edit",
            Self::OrgDelete => "org.delete",
            Self::OrgView => "org.view",
            Self::OrgShare => "org.share",
            Self::OrgExport => "org.export",
            Self::OrgMembersInvite => "org.members.invite",
            Self::OrgMembersManage => "org.members.manage",
            Self::OrgMembersRemove => "org.members.remove",
            Self::OrgAnalyticsView => "org.analytics.view",
            Self::OrgAnalyticsExport => "org.analytics.export",
            Self::OrgSettingsManage => "org.settings.manage",
            Self::OrgTemplatesCreate => "org.templates.create",
            Self::OrgTemplatesEdit => "org.templates.edit",
            Self::OrgTemplatesDelete => "org.templates.delete",
        }
    }

    /// Scope implied by the tag prefix.
    pub fn scope(&self) -> PermissionScope {
        if self.as_str().starts_with("org.") {
            PermissionScope::Organization
        } else {
            PermissionScope::Global
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownTag::new("permission", s))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role Definition
// ═══════════════════════════════════════════════════════════════════════════════

/// Static description of a role and its default permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// Default permissions, in display order.
    pub permissions: &'static [Permission],
    /// UI color tag.
    pub color: &'static str,
    /// Higher is more privileged. Display only; never consulted by evaluation.
    pub level: u32,
}

impl RoleDefinition {
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// User & Membership
// ═══════════════════════════════════════════════════════════════════════════════

/// A portal user with a global role and per-organization memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// `None` when absent or unrecognized; grants nothing.
    #[serde(default, deserialize_with = "lenient_tag")]
    pub global_role: Option<GlobalRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: NaiveDate,
    pub last_active: NaiveDate,
    #[serde(default)]
    pub organization_memberships: Vec<OrganizationMembership>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        global_role: GlobalRole,
        created_at: NaiveDate,
    ) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: email.into(),
            global_role: Some(global_role),
            avatar: None,
            created_at,
            last_active: created_at,
            organization_memberships: Vec::new(),
        }
    }

    /// Attach a membership, replacing any existing one for the same organization.
    pub fn with_membership(mut self, membership: OrganizationMembership) -> Self {
        self.upsert_membership(membership);
        self
    }

    /// First membership matching `organization_id`.
    pub fn membership(&self, organization_id: &OrganizationId) -> Option<&OrganizationMembership> {
        self.organization_memberships
            .iter()
            .find(|m| &m.organization_id == organization_id)
    }

    pub fn is_member_of(&self, organization_id: &OrganizationId) -> bool {
        self.membership(organization_id).is_some()
    }

    /// Keep at most one membership per organization.
    pub fn upsert_membership(&mut self, membership: OrganizationMembership) {
        match self
            .organization_memberships
            .iter_mut()
            .find(|m| m.organization_id == membership.organization_id)
        {
            Some(existing) => *existing = membership,
            None => self.organization_memberships.push(membership),
        }
    }
}

/// Join record binding a user to one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMembership {
    pub organization_id: OrganizationId,
    pub organization_name: String,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub role: Option<OrganizationRole>,
    /// Custom overlay, granted on top of the role defaults.
    #[serde(default, deserialize_with = "lenient_permissions")]
    pub permissions: Vec<Permission>,
    pub joined_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<UserId>,
}

impl OrganizationMembership {
    pub fn new(
        organization_id: impl Into<String>,
        organization_name: impl Into<String>,
        role: OrganizationRole,
        joined_at: NaiveDate,
    ) -> Self {
        Self {
            organization_id: OrganizationId::new(organization_id),
            organization_name: organization_name.into(),
            role: Some(role),
            permissions: Vec::new(),
            joined_at,
            invited_by: None,
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    pub fn invited_by(mut self, user_id: UserId) -> Self {
        self.invited_by = Some(user_id);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission Template
// ═══════════════════════════════════════════════════════════════════════════════

/// A named, reusable bundle of permissions for compatible organization roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "lenient_permissions")]
    pub permissions: Vec<Permission>,
    pub applicable_roles: Vec<OrganizationRole>,
    /// Built-in (`true`) or user-defined.
    #[serde(default)]
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: NaiveDate,
    /// `None` makes the template visible to every organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
}

impl PermissionTemplate {
    /// Create a user-defined template with a generated id.
    pub fn custom(
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: Vec<Permission>,
        applicable_roles: Vec<OrganizationRole>,
        created_at: NaiveDate,
    ) -> Self {
        Self {
            id: TemplateId::generate(),
            name: name.into(),
            description: description.into(),
            permissions,
            applicable_roles,
            is_system: false,
            created_by: None,
            created_at,
            organization_id: None,
        }
    }

    /// Restrict this template to one organization.
    pub fn for_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn applies_to(&self, role: OrganizationRole) -> bool {
        self.applicable_roles.contains(&role)
    }

    /// Global templates are visible everywhere; scoped ones only in their org.
    pub fn visible_in(&self, organization_id: Option<&OrganizationId>) -> bool {
        match (organization_id, &self.organization_id) {
            (None, _) | (_, None) => true,
            (Some(wanted), Some(own)) => wanted == own,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Lenient deserialization
// ═══════════════════════════════════════════════════════════════════════════════

/// Unknown or null tags deserialize to `None` instead of failing the record.
fn lenient_tag<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.parse::<T>() {
        Ok(tag) => Some(tag),
        Err(_) => {
            warn!(value = %s, "Ignoring unknown role tag");
            None
        }
    }))
}

/// Unknown permission strings are dropped from the list.
fn lenient_permissions<'de, D>(deserializer: D) -> Result<Vec<Permission>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|s| match s.parse::<Permission>() {
            Ok(p) => Some(p),
            Err(_) => {
                warn!(value = %s, "Ignoring unknown permission tag");
                None
            }
        })
        .collect())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
