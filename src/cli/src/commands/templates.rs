//! Permission template commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use orgportal_core::rbac::{OrganizationId, OrganizationRole, PermissionTemplate, TemplateId};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use crate::workspace::Workspace;

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List templates, optionally only those a role may receive
    List {
        /// Organization role the templates must apply to
        #[arg(short, long)]
        role: Option<OrganizationRole>,

        /// Organization the templates must be visible in
        #[arg(long)]
        org: Option<String>,
    },

    /// Show one template
    Show {
        /// Template ID
        template_id: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct TemplateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Roles")]
    roles: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Permissions")]
    permissions: usize,
}

impl From<&PermissionTemplate> for TemplateRow {
    fn from(t: &PermissionTemplate) -> Self {
        let scope = match (&t.organization_id, t.is_system) {
            (Some(org), _) => format!("org {}", org),
            (None, true) => "system".to_string(),
            (None, false) => "global".to_string(),
        };
        Self {
            id: t.id.to_string(),
            name: t.name.clone(),
            roles: output::join(&t.applicable_roles),
            scope,
            permissions: t.permissions.len(),
        }
    }
}

pub fn execute(cmd: TemplateCommands, ws: &Workspace, format: OutputFormat) -> Result<()> {
    let evaluator = ws.evaluator();
    match cmd {
        TemplateCommands::List { role, org } => {
            let org = org.map(OrganizationId::new);
            let templates: Vec<&PermissionTemplate> = match role {
                Some(role) => evaluator.applicable_templates(Some(role), org.as_ref()),
                None => evaluator
                    .templates()
                    .iter()
                    .filter(|t| t.visible_in(org.as_ref()))
                    .collect(),
            };
            match format {
                OutputFormat::Table => {
                    let rows: Vec<TemplateRow> =
                        templates.into_iter().map(TemplateRow::from).collect();
                    output::print_list(&rows, format)?;
                }
                _ => output::print_item(&templates, format)?,
            }
        }

        TemplateCommands::Show { template_id } => {
            let template = evaluator
                .templates()
                .get(&TemplateId::new(template_id.as_str()))
                .with_context(|| format!("Template not found: {}", template_id))?;

            match format {
                OutputFormat::Table => {
                    output::print_header(&format!("Template: {}", template.name));
                    output::print_detail("ID", template.id.as_str());
                    output::print_detail("Description", &template.description);
                    output::print_detail("Roles", &output::join(&template.applicable_roles));
                    output::print_detail("System", &template.is_system.to_string());
                    if let Some(org) = &template.organization_id {
                        output::print_detail("Organization", org.as_str());
                    }
                    output::print_detail("Created", &template.created_at.to_string());
                    output::print_detail("Permissions", &output::join(&template.permissions));
                }
                _ => output::print_item(template, format)?,
            }
        }
    }

    Ok(())
}
