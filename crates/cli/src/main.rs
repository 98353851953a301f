//! Delightful Naturals CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! dn-cli migrate
//!
//! # Create an admin user (password read from stdin)
//! echo "$PASSWORD" | dn-cli admin create -e ops@example.com -n "Ops" -r admin
//!
//! # List admin users
//! dn-cli admin list
//!
//! # Reset a password (read from stdin)
//! echo "$PASSWORD" | dn-cli admin reset-password -e ops@example.com
//!
//! # Load products, testimonials and journal posts from YAML
//! dn-cli seed crates/cli/seed/catalog.yaml
//! ```
//!
//! All commands read `DATABASE_URL` (`.env` is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dn-cli")]
#[command(author, version, about = "Delightful Naturals CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Upsert catalog and content from a YAML file
    Seed {
        /// Path to the seed file
        path: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user; the password is read from stdin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// List admin users
    List,
    /// Replace an admin user's password; the new password is read from stdin
    ResetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name, role } => {
                commands::admin::create_user(&email, &name, &role).await?;
            }
            AdminAction::List => commands::admin::list_users().await?,
            AdminAction::ResetPassword { email } => {
                commands::admin::reset_password(&email).await?;
            }
        },
        Commands::Seed { path } => commands::seed::run(&path).await?,
    }
    Ok(())
}
