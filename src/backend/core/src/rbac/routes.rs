//! Route permission table and sidebar navigation catalog.
//!
//! Routes map to the permissions that open them; holding any one is enough.
//! A route with an empty list, or a route missing from the table, is public.

use serde::Serialize;
use std::collections::HashMap;

use super::models::Permission;

use Permission::*;

/// An entry in the portal's navigation sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationItem {
    pub title: &'static str,
    pub href: &'static str,
    pub permissions: Vec<Permission>,
}

/// Static `route → required permissions` map plus the navigation catalog.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Vec<Permission>>,
    navigation: Vec<NavigationItem>,
}

impl RouteTable {
    /// An empty table: every route is public, no navigation.
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
            navigation: Vec::new(),
        }
    }

    /// Add or replace the requirement for a route.
    pub fn with_route(mut self, route: impl Into<String>, permissions: Vec<Permission>) -> Self {
        self.routes.insert(route.into(), permissions);
        self
    }

    pub fn with_navigation(mut self, item: NavigationItem) -> Self {
        self.navigation.push(item);
        self
    }

    /// Required permissions for `route`; empty when unrestricted or unknown.
    pub fn required_permissions(&self, route: &str) -> &[Permission] {
        self.routes.get(route).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Known routes in lexical order.
    pub fn routes(&self) -> Vec<(&str, &[Permission])> {
        let mut routes: Vec<_> = self
            .routes
            .iter()
            .map(|(r, p)| (r.as_str(), p.as_slice()))
            .collect();
        routes.sort_by_key(|(r, _)| *r);
        routes
    }

    pub fn navigation(&self) -> &[NavigationItem] {
        &self.navigation
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        let nav = |title, href, permissions: &[Permission]| NavigationItem {
            title,
            href,
            permissions: permissions.to_vec(),
        };

        Self::empty()
            .with_route("/dashboard", vec![OrgView])
            .with_route("/", vec![OrganizationsCreate])
            .with_route("/templates", vec![OrgView])
            .with_route("/search", vec![OrgView])
            .with_route("/analytics", vec![OrgAnalyticsView])
            .with_route("/settings", vec![OrgSettingsManage])
            .with_route("/help", vec![])
            .with_route("/organization/[id]", vec![OrgView])
            .with_route("/update", vec![OrgEdit])
            .with_route("/members", vec![OrgMembersManage])
            .with_navigation(nav("Home", "/", &[OrganizationsCreate]))
            .with_navigation(nav("Dashboard", "/dashboard", &[OrgView]))
            .with_navigation(nav("Templates", "/templates", &[OrgView]))
            .with_navigation(nav("Search", "/search", &[OrgView]))
            .with_navigation(nav("Analytics", "/analytics", &[OrgAnalyticsView]))
            .with_navigation(nav("Members", "/members", &[OrgMembersManage]))
            .with_navigation(nav("Settings", "/settings", &[OrgSettingsManage]))
            .with_navigation(nav("Help", "/help", &[]))
            .with_navigation(nav("Test Templates", "/test-templates", &[OrgMembersManage]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::models::{
        GlobalRole, OrganizationId, OrganizationMembership, OrganizationRole, User,
    };
    use crate::rbac::AccessEvaluator;
    use chrono::NaiveDate;

    fn member(role: OrganizationRole) -> User {
        let d = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        User::new("3", "Mike Johnson", "mike@example.com", GlobalRole::User, d)
            .with_membership(OrganizationMembership::new("1", "TechCorp Solutions", role, d))
    }

    #[test]
    fn test_reference_table() {
        let table = RouteTable::default();
        assert_eq!(table.required_permissions("/members"), &[OrgMembersManage]);
        assert!(table.required_permissions("/help").is_empty());
        assert!(table.required_permissions("/nowhere").is_empty());
        assert_eq!(table.routes().len(), 10);
        assert_eq!(table.navigation().len(), 9);
    }

    #[test]
    fn test_public_and_unknown_routes_open_to_any_user() {
        let engine = AccessEvaluator::new();
        let u = member(OrganizationRole::OrgViewer);
        assert!(engine.can_access_route(Some(&u), "/help", None));
        assert!(engine.can_access_route(Some(&u), "/not-a-route", None));
        assert!(!engine.can_access_route(None, "/help", None));
    }

    #[test]
    fn test_restricted_routes() {
        let engine = AccessEvaluator::new();
        let u = member(OrganizationRole::OrgViewer);
        let org = OrganizationId::new("1");
        assert!(engine.can_access_route(Some(&u), "/dashboard", Some(&org)));
        assert!(!engine.can_access_route(Some(&u), "/dashboard", None));
        assert!(!engine.can_access_route(Some(&u), "/members", Some(&org)));
        // organizations.create comes from the global role
        assert!(engine.can_access_route(Some(&u), "/", None));
    }

    #[test]
    fn test_visible_navigation_for_viewer() {
        let engine = AccessEvaluator::new();
        let u = member(OrganizationRole::OrgViewer);
        let titles: Vec<_> = engine
            .visible_navigation(Some(&u), Some(&OrganizationId::new("1")))
            .iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["Home", "Dashboard", "Templates", "Search", "Help"]);
    }

    #[test]
    fn test_visible_navigation_for_admin_includes_members() {
        let engine = AccessEvaluator::new();
        let u = member(OrganizationRole::OrgAdmin);
        let items = engine.visible_navigation(Some(&u), Some(&OrganizationId::new("1")));
        assert_eq!(items.len(), 9);
        assert!(engine.visible_navigation(None, None).is_empty());
    }
}
