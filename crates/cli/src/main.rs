//! Astro Tickets CLI - offline tools for carts and catalog content.
//!
//! # Usage
//!
//! ```bash
//! # Decode a persisted cart slot and report dropped entries
//! at-cli cart inspect slot.json
//!
//! # Check every listing under the content directory
//! at-cli catalog check --dir crates/storefront/content
//!
//! # Validate a contact submission and print the payload that would be sent
//! at-cli contact preview -n "Ana" -e ana@example.com -m "Quiero entradas para el grupo"
//! ```
//!
//! # Commands
//!
//! - `cart inspect` - Decode a cart slot the way the storefront restores it
//! - `catalog check` - Load listings and list the files that would be skipped
//! - `contact preview` - Run contact validation and show the outbound payload

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "at-cli")]
#[command(author, version, about = "Astro Tickets CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with persisted cart slots
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Work with catalog content
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Work with contact submissions
    Contact {
        #[command(subcommand)]
        action: ContactAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Decode a cart slot (JSON file) and report what survives
    Inspect {
        /// File holding the slot value
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Load all listings and report rejected files
    Check {
        /// Content directory with `tickets/` and `merch/`
        #[arg(short, long, default_value = "crates/storefront/content")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ContactAction {
    /// Validate a submission and print its payload and WhatsApp link
    Preview {
        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        email: String,

        #[arg(short, long, default_value = "")]
        message: String,

        /// Phone number for the WhatsApp link (digits only)
        #[arg(short, long, env = "CONTACT_WHATSAPP_PHONE", default_value = "34641607924")]
        phone: String,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Inspect { file } => commands::cart::inspect_file(&file)?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Check { dir } => commands::catalog::check(&dir)?,
        },
        Commands::Contact { action } => match action {
            ContactAction::Preview {
                name,
                email,
                message,
                phone,
            } => commands::contact::preview(name, email, message, &phone)?,
        },
    }
    Ok(())
}
