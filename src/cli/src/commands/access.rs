//! Access queries: permission checks, route access and navigation.

use anyhow::Result;
use clap::Args;
use orgportal_core::rbac::{AccessDecision, OrganizationId, Permission, PermissionRequirement};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use crate::workspace::Workspace;

/// Who is asking, and in which organization.
#[derive(Args)]
pub struct Subject {
    /// User ID (defaults to the configured user)
    #[arg(short, long)]
    user: Option<String>,

    /// Organization ID to scope organization permissions to
    #[arg(long)]
    org: Option<String>,
}

impl Subject {
    fn organization(&self) -> Option<OrganizationId> {
        self.org.as_deref().map(OrganizationId::new)
    }
}

#[derive(Args)]
pub struct CheckArgs {
    /// Permissions to check (e.g. org.view)
    #[arg(required = true)]
    permissions: Vec<Permission>,

    /// Require every permission instead of any one
    #[arg(long)]
    all: bool,

    #[command(flatten)]
    subject: Subject,
}

#[derive(Args)]
pub struct RouteArgs {
    /// Route path (e.g. /members)
    route: String,

    #[command(flatten)]
    subject: Subject,
}

#[derive(Args)]
pub struct NavArgs {
    #[command(flatten)]
    subject: Subject,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    user: String,
    organization: Option<String>,
    requirement: PermissionRequirement,
    allowed: bool,
    reason: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct NavRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Path")]
    href: String,
    #[tabled(rename = "Requires any of")]
    permissions: String,
}

pub fn check(args: CheckArgs, ws: &Workspace, format: OutputFormat) -> Result<()> {
    let user = ws.user(args.subject.user.as_deref())?;
    let org = args.subject.organization();
    let evaluator = ws.evaluator();

    let requirement = if args.permissions.len() == 1 {
        PermissionRequirement::Single(args.permissions[0])
    } else {
        PermissionRequirement::from_list(args.permissions, args.all)
    };
    let (allowed, reason) = match &requirement {
        PermissionRequirement::Single(p) => match evaluator.check(Some(&user), *p, org.as_ref()) {
            AccessDecision::Allow => (true, None),
            AccessDecision::Deny(reason) => (false, Some(reason)),
        },
        other => (evaluator.satisfies(Some(&user), other, org.as_ref()), None),
    };

    match format {
        OutputFormat::Table => {
            let subject = match &org {
                Some(org) => format!("{} in organization {}", user.name, org),
                None => user.name.clone(),
            };
            output::print_verdict(allowed, &subject, reason.as_deref());
        }
        _ => output::print_item(
            &CheckResult {
                user: user.id.to_string(),
                organization: org.map(|o| o.to_string()),
                requirement,
                allowed,
                reason,
            },
            format,
        )?,
    }
    Ok(())
}

pub fn route(args: RouteArgs, ws: &Workspace, format: OutputFormat) -> Result<()> {
    let user = ws.user(args.subject.user.as_deref())?;
    let org = args.subject.organization();
    let evaluator = ws.evaluator();

    let required = evaluator.routes().required_permissions(&args.route);
    let allowed = evaluator.can_access_route(Some(&user), &args.route, org.as_ref());

    match format {
        OutputFormat::Table => {
            let reason = if required.is_empty() {
                "unrestricted".to_string()
            } else {
                format!("requires any of: {}", output::join(required))
            };
            output::print_verdict(allowed, &args.route, Some(&reason));
        }
        _ => output::print_item(
            &serde_json::json!({
                "route": args.route,
                "user": user.id,
                "organization": org,
                "required": required,
                "allowed": allowed,
            }),
            format,
        )?,
    }
    Ok(())
}

pub fn nav(args: NavArgs, ws: &Workspace, format: OutputFormat) -> Result<()> {
    let user = ws.user(args.subject.user.as_deref())?;
    let org = args.subject.organization();

    let rows: Vec<NavRow> = ws
        .evaluator()
        .visible_navigation(Some(&user), org.as_ref())
        .into_iter()
        .map(|item| NavRow {
            title: item.title.to_string(),
            href: item.href.to_string(),
            permissions: output::join(&item.permissions),
        })
        .collect();

    output::print_list(&rows, format)
}
