//! Integration tests for permission evaluation.

use chrono::NaiveDate;
use orgportal_core::rbac::{
    AccessEvaluator, GlobalRole, OrganizationId, OrganizationMembership, OrganizationRole,
    Permission, PermissionTemplate, TemplateId, User,
};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

fn org(id: &str) -> OrganizationId {
    OrganizationId::new(id)
}

fn user_with(global: GlobalRole, memberships: Vec<OrganizationMembership>) -> User {
    memberships
        .into_iter()
        .fold(User::new("u", "Test User", "test@example.com", global, day()), |u, m| {
            u.with_membership(m)
        })
}

fn viewer_in(org_id: &str) -> OrganizationMembership {
    OrganizationMembership::new(org_id, "TechCorp Solutions", OrganizationRole::OrgViewer, day())
}

fn template(permissions: Vec<Permission>) -> PermissionTemplate {
    PermissionTemplate::custom(
        "Editors",
        "View and edit",
        permissions,
        vec![OrganizationRole::OrgViewer],
        day(),
    )
}

#[test]
fn test_global_permission_matches_registry() {
    let engine = AccessEvaluator::new();
    for role in GlobalRole::ALL {
        let defaults = role.definition().permissions;
        for p in Permission::ALL {
            assert_eq!(
                engine.has_global_permission(Some(role), p),
                defaults.contains(&p),
                "{role} / {p}"
            );
        }
    }
}

#[test]
fn test_global_grant_ignores_organization_scope() {
    let engine = AccessEvaluator::new();
    let admin = user_with(GlobalRole::SuperAdmin, vec![]);

    assert!(engine.has_permission(Some(&admin), Permission::UsersManageGlobal, None));
    assert!(engine.has_permission(Some(&admin), Permission::UsersManageGlobal, Some(&org("1"))));
    let unknown = org("unknown");
    assert!(engine.has_permission(Some(&admin), Permission::UsersManageGlobal, Some(&unknown)));
}

#[test]
fn test_absent_user_is_always_denied() {
    let engine = AccessEvaluator::new();
    for p in Permission::ALL {
        assert!(!engine.has_permission(None, p, None));
        assert!(!engine.has_permission(None, p, Some(&org("1"))));
    }
    assert!(!engine.has_any_permission(None, &Permission::ALL, Some(&org("1"))));
    assert!(!engine.has_all_permissions(None, &[Permission::OrgView], Some(&org("1"))));
}

#[test]
fn test_empty_lists_deny_but_empty_routes_allow() {
    let engine = AccessEvaluator::new();
    let u = user_with(GlobalRole::SuperAdmin, vec![viewer_in("1")]);

    assert!(!engine.has_all_permissions(Some(&u), &[], Some(&org("1"))));
    assert!(!engine.has_any_permission(Some(&u), &[], Some(&org("1"))));
    assert!(engine.can_access_route(Some(&u), "/help", Some(&org("1"))));
}

#[test]
fn test_viewer_membership() {
    let engine = AccessEvaluator::new();
    let u = user_with(GlobalRole::User, vec![viewer_in("1")]);

    assert!(engine.has_permission(Some(&u), Permission::OrgView, Some(&org("1"))));
    assert!(!engine.has_permission(Some(&u), Permission::OrgEdit, Some(&org("1"))));
    // organization permissions need an explicit organization
    assert!(!engine.has_permission(Some(&u), Permission::OrgView, None));
    assert!(!engine.has_permission(Some(&u), Permission::OrgView, Some(&org("2"))));
}

#[test]
fn test_overlay_is_additive() {
    let engine = AccessEvaluator::new();
    let m = viewer_in("1").with_permissions([Permission::OrgExport]);
    let u = user_with(GlobalRole::User, vec![m]);

    assert!(engine.has_permission(Some(&u), Permission::OrgExport, Some(&org("1"))));
    assert!(engine.has_permission(Some(&u), Permission::OrgView, Some(&org("1"))));
    assert!(engine.has_all_permissions(
        Some(&u),
        &[Permission::OrgView, Permission::OrgExport],
        Some(&org("1"))
    ));
    assert!(!engine.has_all_permissions(
        Some(&u),
        &[Permission::OrgView, Permission::OrgDelete],
        Some(&org("1"))
    ));
}

#[test]
fn test_apply_and_remove_are_idempotent() {
    let engine = AccessEvaluator::new();
    let m = viewer_in("1").with_permissions([Permission::OrgShare]);
    let t = template(vec![Permission::OrgView, Permission::OrgEdit]);

    let once = engine.apply_template(&m, Some(&t));
    let twice = engine.apply_template(&once, Some(&t));
    assert_eq!(once, twice);

    let removed = engine.remove_template(&once, Some(&t));
    let removed_twice = engine.remove_template(&removed, Some(&t));
    assert_eq!(removed, removed_twice);
    assert_eq!(removed.permissions, vec![Permission::OrgShare]);
}

#[test]
fn test_remove_after_apply_strips_preexisting_overlap() {
    let engine = AccessEvaluator::new();
    let m = viewer_in("1").with_permissions([Permission::OrgView]);
    let t = template(vec![Permission::OrgView, Permission::OrgEdit]);

    let applied = engine.apply_template(&m, Some(&t));
    assert_eq!(applied.permissions, vec![Permission::OrgView, Permission::OrgEdit]);

    let removed = engine.remove_template(&applied, Some(&t));
    assert!(removed.permissions.is_empty());
    assert_ne!(removed, m);

    // role defaults survive removal
    let u = user_with(GlobalRole::User, vec![removed]);
    assert!(engine.has_permission(Some(&u), Permission::OrgView, Some(&org("1"))));
    assert!(!engine.has_permission(Some(&u), Permission::OrgEdit, Some(&org("1"))));
}

#[test]
fn test_absent_template_is_passthrough() {
    let engine = AccessEvaluator::new();
    let m = viewer_in("1").with_permissions([Permission::OrgShare]);
    assert_eq!(engine.apply_template(&m, None), m);
    assert_eq!(engine.remove_template(&m, None), m);
}

#[test]
fn test_applicable_templates_for_viewer() {
    let engine = AccessEvaluator::new();
    let names: Vec<_> = engine
        .applicable_templates(Some(OrganizationRole::OrgViewer), None)
        .into_iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["Analytics Viewer", "Read Only"]);
    assert!(engine.applicable_templates(None, None).is_empty());
}

#[test]
fn test_system_template_ids_are_stable() {
    let engine = AccessEvaluator::new();
    let full = engine
        .templates()
        .get(&TemplateId::new("template-full-access"))
        .unwrap();
    assert!(full.is_system);
    assert_eq!(full.permissions, OrganizationRole::OrgAdmin.definition().permissions);
}

#[test]
fn test_unknown_tags_fail_closed() {
    let engine = AccessEvaluator::new();
    let json = r#"{
        "id": "9",
        "name": "Legacy",
        "email": "legacy@example.com",
        "globalRole": "root",
        "createdAt": "2024-01-01",
        "lastActive": "2024-01-01",
        "organizationMemberships": [{
            "organizationId": "1",
            "organizationName": "TechCorp Solutions",
            "role": "org_owner",
            "permissions": ["org.view", "org.teleport"],
            "joinedAt": "2024-01-01"
        }]
    }"#;
    let u: User = serde_json::from_str(json).unwrap();

    assert_eq!(u.global_role, None);
    assert_eq!(u.organization_memberships[0].role, None);
    assert_eq!(u.organization_memberships[0].permissions, vec![Permission::OrgView]);
    assert!(!engine.has_permission(Some(&u), Permission::OrganizationsCreate, None));
    assert!(engine.has_permission(Some(&u), Permission::OrgView, Some(&org("1"))));
    assert!(!engine.has_permission(Some(&u), Permission::OrgEdit, Some(&org("1"))));
}

#[test]
fn test_evaluator_is_shareable_across_threads() {
    let engine = AccessEvaluator::new();
    let u = user_with(GlobalRole::User, vec![viewer_in("1")]);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..100 {
                    assert!(engine.has_permission(Some(&u), Permission::OrgView, Some(&org("1"))));
                }
            });
        }
    });
}
