//! orgportal - command-line interface to the organization portal's access model.
//!
//! Provides commands for roles, templates, access checks, users, memberships,
//! and CLI configuration.

mod commands;
mod output;
mod workspace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{access, config, members, roles, templates, users};
use orgportal_core::config::PortalConfig;
use orgportal_core::telemetry;
use output::OutputFormat;
use workspace::Workspace;

/// orgportal - organization portal access CLI
#[derive(Parser)]
#[command(
    name = "orgportal",
    author = "Aezi <aezi.zhu@icloud.com>",
    version = "0.1.0",
    about = "Inspect and manage organization portal access",
    long_about = "Evaluate roles, permissions and templates against a user directory file.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// User directory file (JSON or YAML)
    #[arg(long, global = true, env = "ORGPORTAL_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Portal configuration file
    #[arg(short, long, global = true, env = "ORGPORTAL_CONFIG")]
    config: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List role definitions
    Roles(roles::RolesArgs),

    /// Permission template catalog
    #[command(subcommand)]
    Templates(templates::TemplateCommands),

    /// Check whether a user holds permissions
    Check(access::CheckArgs),

    /// Check whether a user may open a route
    Route(access::RouteArgs),

    /// Show the navigation a user sees
    Nav(access::NavArgs),

    /// User directory operations
    #[command(subcommand)]
    Users(users::UserCommands),

    /// Organization membership operations
    #[command(subcommand)]
    Members(members::MemberCommands),

    /// CLI configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Load the portal configuration, start logging and open the directory.
fn open_workspace(
    config_path: Option<&str>,
    directory: Option<PathBuf>,
    verbose: bool,
) -> Result<Workspace> {
    let portal = match config_path {
        Some(path) => PortalConfig::from_file(path)?,
        None => PortalConfig::load()?,
    };

    let mut logging = portal.logging.clone();
    if verbose {
        logging = logging.with_level("debug");
    }
    telemetry::init_logging(&logging, &portal.environment)?;

    Workspace::open(portal, directory)
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.output;
    let open = || open_workspace(cli.config.as_deref(), cli.directory.clone(), cli.verbose);

    match cli.command {
        Commands::Roles(args) => roles::execute(args, format),
        Commands::Templates(cmd) => templates::execute(cmd, &open()?, format),
        Commands::Check(args) => access::check(args, &open()?, format),
        Commands::Route(args) => access::route(args, &open()?, format),
        Commands::Nav(args) => access::nav(args, &open()?, format),
        Commands::Users(cmd) => users::execute(cmd, &open()?, format),
        Commands::Members(cmd) => members::execute(cmd, &open()?, format),
        Commands::Config(cmd) => config::execute(cmd, format),
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
