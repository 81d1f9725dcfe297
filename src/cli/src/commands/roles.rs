//! Role catalog commands.

use anyhow::Result;
use clap::{Args, ValueEnum};
use orgportal_core::rbac::{GlobalRole, OrganizationRole, RoleDefinition};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RolesArgs {
    /// Show only global or only organization roles
    #[arg(long, value_enum)]
    scope: Option<RoleScope>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleScope {
    Global,
    Organization,
}

#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Level")]
    level: u32,
    #[tabled(rename = "Permissions")]
    permissions: String,
}

fn row(tag: &str, scope: &str, def: &RoleDefinition) -> RoleRow {
    RoleRow {
        role: tag.to_string(),
        scope: scope.to_string(),
        name: def.name.to_string(),
        level: def.level,
        permissions: output::join(def.permissions),
    }
}

fn catalog(scope: Option<RoleScope>) -> Vec<RoleRow> {
    let mut rows = Vec::new();
    if scope != Some(RoleScope::Organization) {
        rows.extend(
            GlobalRole::all()
                .into_iter()
                .map(|r| row(r.as_str(), "global", r.definition())),
        );
    }
    if scope != Some(RoleScope::Global) {
        rows.extend(
            OrganizationRole::all()
                .into_iter()
                .map(|r| row(r.as_str(), "organization", r.definition())),
        );
    }
    rows
}

pub fn execute(args: RolesArgs, format: OutputFormat) -> Result<()> {
    output::print_list(&catalog(args.scope), format)
}
