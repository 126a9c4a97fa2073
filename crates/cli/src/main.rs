//! Enlist CLI - Database migrations and account tooling.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! enlist migrate
//!
//! # Delete expired, unconfirmed confirmation tokens
//! enlist tokens purge
//!
//! # Show an account
//! enlist user show -e ann@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `tokens purge` - Delete expired confirmation tokens
//! - `user show` - Print an account's status

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "enlist")]
#[command(author, version, about = "Enlist CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage confirmation tokens
    Tokens {
        #[command(subcommand)]
        action: TokensAction,
    },
    /// Inspect accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum TokensAction {
    /// Delete unconfirmed tokens past their expiry
    Purge,
}

#[derive(Subcommand)]
enum UserAction {
    /// Show an account by email
    Show {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

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
        Commands::Tokens { action } => match action {
            TokensAction::Purge => commands::tokens::purge().await?,
        },
        Commands::User { action } => match action {
            UserAction::Show { email } => commands::user::show(&email).await?,
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
    fn test_parse_user_show() {
        let cli = Cli::try_parse_from(["enlist", "user", "show", "-e", "ann@example.com"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Show { email }
            }) if email == "ann@example.com"
        ));
    }

    #[test]
    fn test_user_show_requires_email() {
        assert!(Cli::try_parse_from(["enlist", "user", "show"]).is_err());
    }
}
