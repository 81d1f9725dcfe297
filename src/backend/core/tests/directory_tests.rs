//! Integration tests for the user directory and sessions, run against the demo data set.

use orgportal_core::directory::AccessDirectory;
use orgportal_core::error::ErrorCode;
use chrono::NaiveDate;
use orgportal_core::rbac::{
    AccessEvaluator, GlobalRole, OrganizationId, OrganizationRole, Permission, PermissionTemplate,
    RouteTable, TemplateId, TemplateRegistry, UserId,
};
use orgportal_core::session::Session;

const DEMO: &str = include_str!("../../../../demos/directory.json");

fn directory() -> AccessDirectory {
    AccessDirectory::from_json(AccessEvaluator::new(), DEMO).unwrap()
}

fn uid(id: &str) -> UserId {
    UserId::new(id)
}

fn org(id: &str) -> OrganizationId {
    OrganizationId::new(id)
}

#[test]
fn test_demo_directory_loads() {
    let dir = directory();
    assert_eq!(dir.len(), 4);
    let sarah = dir.get_user(&uid("4")).unwrap();
    assert_eq!(sarah.global_role, Some(GlobalRole::User));
    assert_eq!(
        sarah.organization_memberships[0].role,
        Some(OrganizationRole::OrgViewer)
    );
}

#[test]
fn test_admin_can_promote_user() {
    let dir = directory();
    assert!(dir.update_global_role(&uid("2"), &uid("4"), GlobalRole::Admin).unwrap());
    assert_eq!(dir.get_user(&uid("4")).unwrap().global_role, Some(GlobalRole::Admin));
}

#[test]
fn test_plain_user_cannot_change_global_roles() {
    let dir = directory();
    let err = dir
        .update_global_role(&uid("3"), &uid("4"), GlobalRole::SuperAdmin)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientPermissions);
    assert_eq!(dir.get_user(&uid("4")).unwrap().global_role, Some(GlobalRole::User));
}

#[test]
fn test_org_admin_manages_only_their_org() {
    let dir = directory();

    // Mike is org_admin of EduLearn but only a member of TechCorp
    let err = dir
        .update_organization_role(&uid("3"), &uid("4"), &org("1"), OrganizationRole::OrgMember)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientPermissions);

    // John is org_admin of TechCorp
    assert!(dir
        .update_organization_role(&uid("1"), &uid("4"), &org("1"), OrganizationRole::OrgMember)
        .unwrap());
    let sarah = dir.get_user(&uid("4")).unwrap();
    assert_eq!(
        sarah.membership(&org("1")).unwrap().role,
        Some(OrganizationRole::OrgMember)
    );
}

#[test]
fn test_missing_target_or_membership_is_a_noop() {
    let dir = directory();
    assert!(!dir
        .update_organization_role(&uid("1"), &uid("99"), &org("1"), OrganizationRole::OrgViewer)
        .unwrap());
    // Mike administers EduLearn, where Sarah has no membership
    assert!(!dir
        .update_organization_role(&uid("3"), &uid("4"), &org("3"), OrganizationRole::OrgViewer)
        .unwrap());
    assert!(!dir.get_user(&uid("4")).unwrap().is_member_of(&org("3")));

    // Jane is not a member of HealthFirst at all
    let err = dir
        .update_organization_role(&uid("2"), &uid("1"), &org("2"), OrganizationRole::OrgViewer)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientPermissions);
}

#[test]
fn test_template_application_flows_into_evaluation() {
    let dir = directory();
    let analytics = TemplateId::new("template-analytics-viewer");
    let sarah = uid("4");
    let techcorp = org("1");

    let before = dir.get_user(&sarah).unwrap();
    assert!(!dir
        .evaluator()
        .has_permission(Some(&before), Permission::OrgAnalyticsView, Some(&techcorp)));

    assert!(dir
        .apply_permission_template(&uid("1"), &sarah, &techcorp, &analytics)
        .unwrap());
    let after = dir.get_user(&sarah).unwrap();
    assert!(dir
        .evaluator()
        .has_permission(Some(&after), Permission::OrgAnalyticsView, Some(&techcorp)));
    assert_eq!(
        after.membership(&techcorp).unwrap().permissions,
        vec![Permission::OrgView, Permission::OrgAnalyticsView]
    );

    assert!(dir
        .remove_permission_template(&uid("1"), &sarah, &techcorp, &analytics)
        .unwrap());
    let removed = dir.get_user(&sarah).unwrap();
    assert!(removed.membership(&techcorp).unwrap().permissions.is_empty());
    // org.view still comes from the viewer role
    assert!(dir
        .evaluator()
        .has_permission(Some(&removed), Permission::OrgView, Some(&techcorp)));
}

#[test]
fn test_unknown_template_is_reported_after_authorization() {
    let dir = directory();
    let missing = TemplateId::new("template-missing");

    let err = dir
        .apply_permission_template(&uid("1"), &uid("4"), &org("1"), &missing)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TemplateNotFound);

    let err = dir
        .apply_permission_template(&uid("4"), &uid("4"), &org("1"), &missing)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientPermissions);
}

#[test]
fn test_org_scoped_template_cannot_cross_organizations() {
    let mut purge = PermissionTemplate::custom(
        "HealthFirst Purge",
        "Delete access for HealthFirst only",
        vec![Permission::OrgDelete],
        vec![OrganizationRole::OrgViewer],
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    )
    .for_organization(org("2"));
    purge.id = TemplateId::new("template-healthfirst-purge");

    let registry = TemplateRegistry::system().with_template(purge);
    let evaluator = AccessEvaluator::with_registries(registry, RouteTable::default());
    let dir = AccessDirectory::from_json(evaluator, DEMO).unwrap();
    let purge_id = TemplateId::new("template-healthfirst-purge");

    let names: Vec<String> = dir
        .available_templates(&uid("4"), &org("1"))
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Analytics Viewer", "Read Only"]);

    // John administers TechCorp, but the template belongs to HealthFirst
    let err = dir
        .apply_permission_template(&uid("1"), &uid("4"), &org("1"), &purge_id)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TemplateNotFound);
    let err = dir
        .remove_permission_template(&uid("1"), &uid("4"), &org("1"), &purge_id)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TemplateNotFound);

    let sarah = dir.get_user(&uid("4")).unwrap();
    assert!(sarah.membership(&org("1")).unwrap().permissions.is_empty());
    assert!(!dir
        .evaluator()
        .has_permission(Some(&sarah), Permission::OrgDelete, Some(&org("1"))));
}

#[test]
fn test_available_templates_by_role() {
    let dir = directory();
    let names = |user: &str, org_id: &str| -> Vec<String> {
        dir.available_templates(&uid(user), &org(org_id))
            .into_iter()
            .map(|t| t.name)
            .collect()
    };

    assert_eq!(names("4", "1"), vec!["Analytics Viewer", "Read Only"]);
    assert_eq!(names("2", "1"), vec!["Content Manager", "Member Manager"]);
    assert!(names("4", "2").is_empty());
}

#[test]
fn test_snapshot_round_trip() {
    let dir = directory();
    dir.update_global_role(&uid("1"), &uid("3"), GlobalRole::Admin)
        .unwrap();
    let json = dir.to_json().unwrap();

    let reloaded = AccessDirectory::from_json(AccessEvaluator::new(), &json).unwrap();
    assert_eq!(reloaded.snapshot(), dir.snapshot());
}

#[test]
fn test_session_over_directory_user() {
    let dir = directory();
    let engine = dir.evaluator();
    let mike = dir.get_user(&uid("3")).unwrap();
    let mut session = Session::for_user(mike);

    assert_eq!(session.current_organization_id(), Some(&org("1")));
    assert!(!session.has_permission(engine, Permission::OrgMembersManage, None));

    assert!(session.switch_organization(&org("3")));
    assert!(session.has_permission(engine, Permission::OrgMembersManage, None));
    assert!(engine.can_access_route(session.user(), "/members", session.current_organization_id()));

    let titles: Vec<_> = engine
        .visible_navigation(session.user(), session.current_organization_id())
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert!(titles.contains(&"Members"));
    assert!(titles.contains(&"Help"));
}
