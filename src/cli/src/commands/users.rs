//! User directory commands.

use anyhow::Result;
use clap::Subcommand;
use orgportal_core::rbac::{GlobalRole, User, UserId};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use crate::workspace::Workspace;

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    List,

    /// Show a user's roles and effective permissions
    Show {
        /// User ID
        user_id: String,
    },

    /// Change a user's global role (requires users.manage_global)
    SetRole {
        /// User ID to change
        user_id: String,

        /// New global role
        role: GlobalRole,

        /// Acting user ID (defaults to the configured user)
        #[arg(long = "as")]
        actor: Option<String>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Global Role")]
    global_role: String,
    #[tabled(rename = "Organizations")]
    organizations: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct MembershipRow {
    #[tabled(rename = "Org")]
    organization_id: String,
    #[tabled(rename = "Name")]
    organization_name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Custom")]
    custom: String,
    #[tabled(rename = "Effective")]
    effective: String,
}

fn role_label<R: ToString>(role: Option<R>) -> String {
    role.map(|r| r.to_string()).unwrap_or_else(|| "(none)".to_string())
}

fn user_row(u: &User) -> UserRow {
    UserRow {
        id: u.id.to_string(),
        name: u.name.clone(),
        email: u.email.clone(),
        global_role: role_label(u.global_role),
        organizations: u.organization_memberships.len(),
    }
}

pub fn execute(cmd: UserCommands, ws: &Workspace, format: OutputFormat) -> Result<()> {
    match cmd {
        UserCommands::List => {
            let rows: Vec<UserRow> = ws.directory().users().iter().map(user_row).collect();
            output::print_list(&rows, format)?;
        }

        UserCommands::Show { user_id } => {
            let user = ws.user(Some(&user_id))?;
            if format != OutputFormat::Table {
                return output::print_item(&user, format);
            }

            let evaluator = ws.evaluator();
            output::print_header(&format!("User: {}", user.name));
            output::print_detail("ID", user.id.as_str());
            output::print_detail("Email", &user.email);
            output::print_detail("Global Role", &role_label(user.global_role));
            let global = user
                .global_role
                .map(|r| output::join(r.definition().permissions))
                .unwrap_or_else(|| "-".to_string());
            output::print_detail("Global Permissions", &global);
            output::print_detail("Last Active", &user.last_active.to_string());

            let rows: Vec<MembershipRow> = user
                .organization_memberships
                .iter()
                .map(|m| MembershipRow {
                    organization_id: m.organization_id.to_string(),
                    organization_name: m.organization_name.clone(),
                    role: role_label(m.role),
                    custom: output::join(&m.permissions),
                    effective: output::join(evaluator.effective_permissions(m)),
                })
                .collect();
            println!();
            output::print_list(&rows, format)?;
        }

        UserCommands::SetRole { user_id, role, actor } => {
            let actor = ws.user(actor.as_deref())?;
            let target = UserId::new(user_id);
            if ws.directory().update_global_role(&actor.id, &target, role)? {
                ws.save()?;
                output::print_success(&format!("{} is now {}", target, role));
            } else {
                output::print_info(&format!("No user {}; nothing changed", target));
            }
        }
    }

    Ok(())
}
