//! Cartwright CLI - Database migrations and operational tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cw-cli migrate
//!
//! # Load products (and optionally users) from YAML
//! cw-cli seed catalog.yaml
//!
//! # Stock administration
//! cw-cli stock set 12 40
//! cw-cli stock restock 12 5
//!
//! # Exercise cart sync against a running storefront
//! cw-cli cart sync --user 3 --add 5
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog from a YAML file
//! - `stock set|restock` - Administrative stock writes
//! - `cart sync` - Drive the cart reconciler and print the resulting cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use cartwright_core::{ProductId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(author, version, about = "Cartwright CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed products and users from a YAML file
    Seed {
        /// Path to the seed file
        file: String,
    },
    /// Administer product stock
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Client-side cart tools
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Set an absolute stock level
    Set {
        /// Product id
        product: ProductId,
        /// New stock level
        level: u32,
    },
    /// Return units to stock
    Restock {
        /// Product id
        product: ProductId,
        /// Units to add
        quantity: i64,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Replay cart edits through the reconciler
    Sync {
        /// User to log in as
        #[arg(short, long)]
        user: Option<UserId>,

        /// Product to add before login (guest cart)
        #[arg(long = "guest-add")]
        guest_add: Vec<ProductId>,

        /// Product to add after login (repeat for more units)
        #[arg(short, long)]
        add: Vec<ProductId>,

        /// Product to remove one unit of
        #[arg(short, long)]
        remove: Vec<ProductId>,
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
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Stock { action } => match action {
            StockAction::Set { product, level } => commands::stock::set(product, level).await?,
            StockAction::Restock { product, quantity } => {
                commands::stock::restock(product, quantity).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Sync {
                user,
                guest_add,
                add,
                remove,
            } => {
                let lines = commands::cart::sync(commands::cart::SyncPlan {
                    user,
                    guest_add,
                    add,
                    remove,
                })
                .await?;

                #[allow(clippy::print_stdout)]
                {
                    println!("{}", serde_json::to_string_pretty(&lines)?);
                }
            }
        },
    }
    Ok(())
}
