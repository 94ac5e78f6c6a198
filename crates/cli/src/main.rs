//! InnovaCart CLI - Maintenance commands against the store database.
//!
//! # Usage
//!
//! ```bash
//! # Show or reset the site settings record
//! ic-cli settings show
//! ic-cli settings reset
//!
//! # Record the ADMIN_EMAILS allowlist in the database
//! ic-cli admins init
//!
//! # Create and list coupons
//! ic-cli coupons create --discount 10 --type percentage --expires 2026-12-31
//! ic-cli coupons list
//!
//! # Check connectivity
//! ic-cli check
//! ```
//!
//! # Environment Variables
//!
//! - `FIREBASE_DATABASE_URL` - Realtime Database URL (or `memory://`)
//! - `FIREBASE_DATABASE_SECRET` - Optional database secret
//! - `ADMIN_EMAILS` - Comma-separated admin allowlist (`admins init`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use innovacart_core::DiscountType;
use innovacart_core::coupon::DEFAULT_MAX_USAGE;

mod commands;

#[derive(Parser)]
#[command(name = "ic-cli")]
#[command(author, version, about = "InnovaCart maintenance tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or reset the site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage the admin roster
    Admins {
        #[command(subcommand)]
        action: AdminsAction,
    },
    /// Manage discount coupons
    Coupons {
        #[command(subcommand)]
        action: CouponsAction,
    },
    /// Check that the database is reachable
    Check,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the stored settings as JSON
    Show,
    /// Overwrite the settings with defaults
    Reset,
}

#[derive(Subcommand)]
enum AdminsAction {
    /// Write the admin roster from `ADMIN_EMAILS` if none exists
    Init,
    /// List the stored admin roster
    List,
}

#[derive(Subcommand)]
enum CouponsAction {
    /// Create a coupon
    Create {
        /// Coupon code; a random one is generated when omitted
        #[arg(long)]
        code: Option<String>,

        /// Percentage or taka amount
        #[arg(long)]
        discount: Decimal,

        /// `percentage` or `fixed`
        #[arg(long = "type", default_value = "percentage")]
        discount_type: DiscountType,

        /// Maximum number of redemptions
        #[arg(long, default_value_t = DEFAULT_MAX_USAGE)]
        max_usage: u32,

        /// Last valid day (YYYY-MM-DD)
        #[arg(long)]
        expires: NaiveDate,
    },
    /// List all coupons
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let repos = commands::connect()?;

    match cli.command {
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show(&repos).await?,
            SettingsAction::Reset => commands::settings::reset(&repos).await?,
        },
        Commands::Admins { action } => match action {
            AdminsAction::Init => {
                let emails = commands::admins::emails_from_env()?;
                commands::admins::init(&repos, &emails).await?;
            }
            AdminsAction::List => commands::admins::list(&repos).await?,
        },
        Commands::Coupons { action } => match action {
            CouponsAction::Create {
                code,
                discount,
                discount_type,
                max_usage,
                expires,
            } => {
                let request = commands::coupons::CreateCoupon {
                    code,
                    discount,
                    discount_type,
                    max_usage,
                    expires,
                };
                commands::coupons::create(&repos, request).await?;
            }
            CouponsAction::List => commands::coupons::list(&repos).await?,
        },
        Commands::Check => commands::check::run(&repos).await?,
    }
    Ok(())
}
