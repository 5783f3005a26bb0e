//! Aurelia CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront record table
//! aurelia migrate
//!
//! # Seed the built-in product catalog (no-op if products exist)
//! aurelia seed products
//!
//! # Show how many products are indexed
//! aurelia seed status
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "aurelia")]
#[command(author, version, about = "Aurelia storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the entity store
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Write the built-in product catalog if the store has none
    Products,
    /// Show the number of indexed products
    Status,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products => commands::seed::products().await?,
            SeedTarget::Status => commands::seed::status().await?,
        },
    }
    Ok(())
}
