//! Role registry: the fixed definitions behind every global and organization role.
//!
//! | Role           | Scope        | Level | Summary                                      |
//! |----------------|--------------|-------|----------------------------------------------|
//! | super_admin    | global       | 100   | Full system access across all organizations  |
//! | admin          | global       | 50    | Manage users and create organizations        |
//! | user           | global       | 10    | Standard user with organization access       |
//! | org_admin      | organization | 100   | Full control over the organization           |
//! | org_manager    | organization | 75    | Manage organization and invite members       |
//! | org_member     | organization | 50    | Edit organization content                    |
//! | org_viewer     | organization | 25    | Read-only access                             |
//!
//! Lookups are exhaustive `match`es, so every role is guaranteed a definition.

use super::models::{GlobalRole, OrganizationRole, Permission, RoleDefinition};

use Permission::*;

static SUPER_ADMIN: RoleDefinition = RoleDefinition {
    name: "Super Administrator",
    description: "Full system access across all organizations",
    permissions: &[
        SystemManage,
        UsersManageGlobal,
        OrganizationsCreate,
        OrganizationsViewAll,
        TemplatesManageGlobal,
    ],
    color: "bg-purple-100 text-purple-800",
    level: 100,
};

static ADMIN: RoleDefinition = RoleDefinition {
    name: "Administrator",
    description: "Can manage users and create organizations",
    permissions: &[UsersManageGlobal, OrganizationsCreate, OrganizationsViewAll],
    color: "bg-red-100 text-red-800",
    level: 50,
};

static USER: RoleDefinition = RoleDefinition {
    name: "User",
    description: "Standard user with organization access",
    permissions: &[OrganizationsCreate],
    color: "bg-blue-100 text-blue-800",
    level: 10,
};

static ORG_ADMIN: RoleDefinition = RoleDefinition {
    name: "Organization Admin",
    description: "Full control over the organization",
    permissions: &[
        OrgManage,
        OrgEdit,
        OrgDelete,
        OrgView,
        OrgShare,
        OrgExport,
        OrgMembersInvite,
        OrgMembersManage,
        OrgMembersRemove,
        OrgAnalyticsView,
        OrgAnalyticsExport,
        OrgSettingsManage,
        OrgTemplatesCreate,
        OrgTemplatesEdit,
        OrgTemplatesDelete,
    ],
    color: "bg-red-100 text-red-800",
    level: 100,
};

static ORG_MANAGER: RoleDefinition = RoleDefinition {
    name: "Organization Manager",
    description: "Can manage organization and invite members",
    permissions: &[
        OrgEdit,
        OrgView,
        OrgShare,
        OrgExport,
        OrgMembersInvite,
        OrgAnalyticsView,
        OrgAnalyticsExport,
        OrgTemplatesCreate,
        OrgTemplatesEdit,
    ],
    color: "bg-blue-100 text-blue-800",
    level: 75,
};

static ORG_MEMBER: RoleDefinition = RoleDefinition {
    name: "Organization Member",
    description: "Can edit organization content",
    permissions: &[OrgEdit, OrgView, OrgShare, OrgAnalyticsView, OrgTemplatesCreate],
    color: "bg-green-100 text-green-800",
    level: 50,
};

static ORG_VIEWER: RoleDefinition = RoleDefinition {
    name: "Organization Viewer",
    description: "Read-only access to organization",
    permissions: &[OrgView],
    color: "bg-gray-100 text-gray-800",
    level: 25,
};

impl GlobalRole {
    /// The registry entry for this role.
    pub fn definition(&self) -> &'static RoleDefinition {
        match self {
            Self::SuperAdmin => &SUPER_ADMIN,
            Self::Admin => &ADMIN,
            Self::User => &USER,
        }
    }

    /// All global roles, most privileged first.
    pub fn all() -> Vec<GlobalRole> {
        roles_by_level(Self::ALL, |r| r.definition().level)
    }
}

impl OrganizationRole {
    /// The registry entry for this role.
    pub fn definition(&self) -> &'static RoleDefinition {
        match self {
            Self::OrgAdmin => &ORG_ADMIN,
            Self::OrgManager => &ORG_MANAGER,
            Self::OrgMember => &ORG_MEMBER,
            Self::OrgViewer => &ORG_VIEWER,
        }
    }

    /// All organization roles, most privileged first.
    pub fn all() -> Vec<OrganizationRole> {
        roles_by_level(Self::ALL, |r| r.definition().level)
    }
}

/// Absent-safe lookup; a missing role has no definition.
pub fn global_role_definition(role: Option<GlobalRole>) -> Option<&'static RoleDefinition> {
    role.map(|r| r.definition())
}

/// Absent-safe lookup; a missing role has no definition.
pub fn organization_role_definition(
    role: Option<OrganizationRole>,
) -> Option<&'static RoleDefinition> {
    role.map(|r| r.definition())
}

fn roles_by_level<R: Copy, const N: usize>(roles: [R; N], level: impl Fn(&R) -> u32) -> Vec<R> {
    let mut sorted = roles.to_vec();
    sorted.sort_by_key(|r| std::cmp::Reverse(level(r)));
    sorted
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
