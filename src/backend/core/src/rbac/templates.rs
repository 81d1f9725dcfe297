//! Template registry: the catalog of reusable permission bundles.
//!
//! The system catalog ships five templates. Deployments may append
//! user-defined templates at startup; after that the registry is read-only
//! and shared behind an `Arc`.

use chrono::NaiveDate;
use std::sync::OnceLock;
use tracing::debug;

use super::models::{
    OrganizationId, OrganizationRole, Permission, PermissionTemplate, TemplateId,
};

use OrganizationRole::*;
use Permission::*;

static SYSTEM_TEMPLATES: OnceLock<Vec<PermissionTemplate>> = OnceLock::new();

/// The built-in templates, constructed once per process.
pub fn system_templates() -> &'static [PermissionTemplate] {
    SYSTEM_TEMPLATES.get_or_init(build_system_templates)
}

fn build_system_templates() -> Vec<PermissionTemplate> {
    let created_at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
    let system = |id: &str,
                  name: &str,
                  description: &str,
                  permissions: &[Permission],
                  roles: &[OrganizationRole]| PermissionTemplate {
        id: TemplateId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        permissions: permissions.to_vec(),
        applicable_roles: roles.to_vec(),
        is_system: true,
        created_by: None,
        created_at,
        organization_id: None,
    };

    vec![
        system(
            "template-full-access",
            "Full Access",
            "Complete access to all organization features",
            &[
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
            &[OrgAdmin],
        ),
        system(
            "template-content-manager",
            "Content Manager",
            "Can manage organization content and basic analytics",
            &[
                OrgEdit,
                OrgView,
                OrgShare,
                OrgExport,
                OrgAnalyticsView,
                OrgTemplatesCreate,
                OrgTemplatesEdit,
            ],
            &[OrgManager, OrgMember],
        ),
        system(
            "template-analytics-viewer",
            "Analytics Viewer",
            "Read-only access with analytics viewing",
            &[OrgView, OrgAnalyticsView],
            &[OrgViewer, OrgMember],
        ),
        system(
            "template-member-manager",
            "Member Manager",
            "Can manage organization members and content",
            &[
                OrgEdit,
                OrgView,
                OrgShare,
                OrgMembersInvite,
                OrgMembersManage,
                OrgAnalyticsView,
            ],
            &[OrgManager],
        ),
        system(
            "template-read-only",
            "Read Only",
            "Basic read-only access to organization",
            &[OrgView],
            &[OrgViewer],
        ),
    ]
}

/// Ordered, immutable catalog of permission templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<PermissionTemplate>,
}

impl TemplateRegistry {
    /// A registry holding exactly `templates`, in order.
    pub fn new(templates: Vec<PermissionTemplate>) -> Self {
        Self { templates }
    }

    /// The reference catalog of built-in templates.
    pub fn system() -> Self {
        Self::new(system_templates().to_vec())
    }

    /// Append a template. Consumes the registry so it can only happen before sharing.
    ///
    /// A template whose id is already registered replaces the earlier entry in place.
    pub fn with_template(mut self, template: PermissionTemplate) -> Self {
        debug!(template_id = %template.id, system = template.is_system, "Registering template");
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
        self
    }

    pub fn with_templates(self, templates: impl IntoIterator<Item = PermissionTemplate>) -> Self {
        templates.into_iter().fold(self, Self::with_template)
    }

    pub fn get(&self, id: &TemplateId) -> Option<&PermissionTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates usable by `role`, optionally narrowed to one organization.
    ///
    /// A template qualifies when it lists `role` and either no organization was
    /// asked for, the template is global, or it belongs to that organization.
    /// Registry order is preserved. An absent role yields nothing.
    pub fn applicable_templates(
        &self,
        role: Option<OrganizationRole>,
        organization_id: Option<&OrganizationId>,
    ) -> Vec<&PermissionTemplate> {
        let Some(role) = role else {
            return Vec::new();
        };
        self.templates
            .iter()
            .filter(|t| t.applies_to(role) && t.visible_in(organization_id))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn names(templates: &[&PermissionTemplate]) -> Vec<String> {
        templates.iter().map(|t| t.name.clone()).collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_system_catalog() {
        let registry = TemplateRegistry::system();
        assert_eq!(registry.len(), 5);
        assert!(registry.iter().all(|t| t.is_system && t.organization_id.is_none()));
        assert!(registry.get(&TemplateId::new("template-read-only")).is_some());
        assert!(registry.get(&TemplateId::new("template-missing")).is_none());
    }

    #[test]
    fn test_viewer_templates() {
        let registry = TemplateRegistry::system();
        let found = registry.applicable_templates(Some(OrgViewer), None);
        assert_eq!(names(&found), vec!["Analytics Viewer", "Read Only"]);
    }

    #[test]
    fn test_member_templates_in_registry_order() {
        let registry = TemplateRegistry::system();
        let found = registry.applicable_templates(Some(OrgMember), None);
        assert_eq!(names(&found), vec!["Content Manager", "Analytics Viewer"]);
    }

    #[test]
    fn test_absent_role_yields_nothing() {
        let registry = TemplateRegistry::system();
        assert!(registry.applicable_templates(None, None).is_empty());
    }

    #[test]
    fn test_org_scoped_template_filtering() {
        let scoped = PermissionTemplate::custom(
            "Exporter",
            "Export only",
            vec![OrgExport],
            vec![OrgViewer],
            date(),
        )
        .for_organization(OrganizationId::new("2"));
        let registry = TemplateRegistry::system().with_template(scoped);

        let org1 = OrganizationId::new("1");
        let org2 = OrganizationId::new("2");

        assert_eq!(registry.applicable_templates(Some(OrgViewer), Some(&org1)).len(), 2);
        assert_eq!(registry.applicable_templates(Some(OrgViewer), Some(&org2)).len(), 3);
        // no organization asked for: scoped templates are included
        assert_eq!(registry.applicable_templates(Some(OrgViewer), None).len(), 3);
    }

    #[test]
    fn test_with_template_replaces_same_id() {
        let mut replacement = system_templates()[4].clone();
        replacement.description = "Changed".to_string();
        let registry = TemplateRegistry::system().with_template(replacement);
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.get(&TemplateId::new("template-read-only")).unwrap().description,
            "Changed"
        );
    }
}
