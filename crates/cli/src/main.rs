//! Folio CLI - database migrations and project management.
//!
//! # Usage
//!
//! ```bash
//! # Run PostgreSQL migrations
//! folio-cli migrate
//!
//! # Print every project as JSON
//! folio-cli projects list
//!
//! # Bulk-create projects from YAML, as the admin
//! folio-cli projects import projects.yaml
//! folio-cli projects import projects.yaml --dry-run
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `projects list` - List projects from the configured store
//! - `projects import` - Validate and create projects from a YAML file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(author, version, about = "Folio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run `PostgreSQL` migrations
    Migrate,
    /// Manage projects in the configured store
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
}

#[derive(Subcommand)]
enum ProjectsAction {
    /// Print all projects as JSON
    List,
    /// Create projects from a YAML file
    Import {
        /// Path to the YAML file (a list of projects)
        file: PathBuf,

        /// Validate the file without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Projects { action } => match action {
            ProjectsAction::List => commands::projects::list().await?,
            ProjectsAction::Import { file, dry_run } => {
                commands::projects::import(&file, dry_run).await?;
            }
        },
    }
    Ok(())
}
