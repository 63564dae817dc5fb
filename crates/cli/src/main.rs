//! RentACam CLI - Database migrations, seeding and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the documents table and both session tables
//! rac-cli migrate
//!
//! # Load products (and their inventory items) from a YAML catalog
//! rac-cli seed catalog.yaml
//!
//! # Create a staff account
//! rac-cli admin create -e admin@example.com -n "Admin Name" -r super_admin -p 'S3cret-pass'
//!
//! # Bring product stock back in line with inventory
//! rac-cli stock reconcile
//! rac-cli stock reconcile --force
//! ```
//!
//! Every command reads `DATABASE_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rac-cli")]
#[command(author, version, about = "RentACam CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (documents and session tables)
    Migrate,
    /// Seed products and inventory from a YAML catalog
    Seed {
        /// Path to the catalog file
        file: PathBuf,
    },
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Stock maintenance
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new staff account
    Create {
        /// Staff email address
        #[arg(short, long)]
        email: String,

        /// Staff display name
        #[arg(short, long)]
        name: String,

        /// Role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Initial password (falls back to `RAC_ADMIN_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,

        /// Require a password change at first sign-in
        #[arg(long)]
        temporary: bool,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Lower product stock that exceeds its inventory item
    Reconcile {
        /// Set product stock equal to inventory, raising it if needed
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

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
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
                temporary,
            } => {
                commands::admin::create_user(&email, &name, &role, password, temporary).await?;
            }
        },
        Commands::Stock { action } => match action {
            StockAction::Reconcile { force } => commands::stock::reconcile(force).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_reconcile_force() {
        let cli = Cli::try_parse_from(["rac-cli", "stock", "reconcile", "--force"]);
        assert!(matches!(
            cli.map(|cli| cli.command),
            Ok(Commands::Stock {
                action: StockAction::Reconcile { force: true }
            })
        ));
    }
}
