//! Organization membership commands: roles and permission templates.

use anyhow::Result;
use clap::{Args, Subcommand};
use orgportal_core::rbac::{OrganizationId, OrganizationRole, TemplateId, UserId};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use crate::workspace::Workspace;

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Change a member's organization role (requires org.members.manage)
    SetRole {
        #[command(flatten)]
        target: Target,

        /// New organization role
        role: OrganizationRole,
    },

    /// Grant a template's permissions to a member
    ApplyTemplate {
        #[command(flatten)]
        target: Target,

        /// Template ID
        template_id: String,
    },

    /// Strip a template's permissions from a member's custom set
    RemoveTemplate {
        #[command(flatten)]
        target: Target,

        /// Template ID
        template_id: String,
    },

    /// Templates a member's role allows
    Templates {
        /// Member user ID
        user_id: String,

        /// Organization ID
        #[arg(long)]
        org: String,
    },
}

/// The membership being changed and who is changing it.
#[derive(Args)]
pub struct Target {
    /// Member user ID
    user_id: String,

    /// Organization ID
    #[arg(long)]
    org: String,

    /// Acting user ID (defaults to the configured user)
    #[arg(long = "as")]
    actor: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct AvailableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn report(ws: &Workspace, changed: bool, done: String, target: &Target) -> Result<()> {
    if changed {
        ws.save()?;
        output::print_success(&done);
    } else {
        output::print_info(&format!(
            "User {} has no membership in organization {}; nothing changed",
            target.user_id, target.org
        ));
    }
    Ok(())
}

pub fn execute(cmd: MemberCommands, ws: &Workspace, format: OutputFormat) -> Result<()> {
    let directory = ws.directory();
    match cmd {
        MemberCommands::SetRole { target, role } => {
            let actor = ws.user(target.actor.as_deref())?;
            let changed = directory.update_organization_role(
                &actor.id,
                &UserId::new(target.user_id.as_str()),
                &OrganizationId::new(target.org.as_str()),
                role,
            )?;
            let done = format!("{} is now {} in organization {}", target.user_id, role, target.org);
            report(ws, changed, done, &target)?;
        }

        MemberCommands::ApplyTemplate { target, template_id } => {
            let actor = ws.user(target.actor.as_deref())?;
            let changed = directory.apply_permission_template(
                &actor.id,
                &UserId::new(target.user_id.as_str()),
                &OrganizationId::new(target.org.as_str()),
                &TemplateId::new(template_id.as_str()),
            )?;
            let done = format!(
                "Applied {} to {} in organization {}",
                template_id, target.user_id, target.org
            );
            report(ws, changed, done, &target)?;
        }

        MemberCommands::RemoveTemplate { target, template_id } => {
            let actor = ws.user(target.actor.as_deref())?;
            let changed = directory.remove_permission_template(
                &actor.id,
                &UserId::new(target.user_id.as_str()),
                &OrganizationId::new(target.org.as_str()),
                &TemplateId::new(template_id.as_str()),
            )?;
            let done = format!(
                "Removed {} from {} in organization {}",
                template_id, target.user_id, target.org
            );
            report(ws, changed, done, &target)?;
        }

        MemberCommands::Templates { user_id, org } => {
            let rows: Vec<AvailableRow> = directory
                .available_templates(&UserId::new(user_id), &OrganizationId::new(org))
                .into_iter()
                .map(|t| AvailableRow {
                    id: t.id.to_string(),
                    name: t.name,
                    description: t.description,
                })
                .collect();
            output::print_list(&rows, format)?;
        }
    }

    Ok(())
}
