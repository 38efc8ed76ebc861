//! Emporium CLI - browse the catalog, manage the session, and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse and search the catalog
//! emporium products
//! emporium products --search mug
//! emporium product 42
//!
//! # Sign in (password is read from stdin)
//! emporium login --email ada@example.com
//!
//! # Order two of product 42 and one of product 7, then pay
//! emporium checkout --item 42:2 --item 7 --shipping-address "1 Main St" --pay
//!
//! # Order history
//! emporium orders
//! ```
//!
//! The session token is kept in `EMPORIUM_TOKEN_PATH` between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use emporium_client::ClientConfig;
use emporium_core::{OrderId, ProductId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CartLine, CliError, Context};

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium shop client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog, or search it
    Products {
        /// Free-text search query
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Product { id: ProductId },
    /// Set the stock level of a product
    Restock { id: ProductId, quantity: i32 },
    /// Create an account and sign in (password read from stdin)
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Sign in (password read from stdin)
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your orders
    Orders,
    /// Show one order
    Order { id: OrderId },
    /// Put items in a cart and place an order
    Checkout {
        /// Product to order as `ID` or `ID:QUANTITY` (repeatable)
        #[arg(short, long = "item", required = true, value_parser = commands::parse_cart_line)]
        items: Vec<CartLine>,

        #[arg(long)]
        shipping_address: String,

        #[arg(long, default_value = "CREDIT_CARD")]
        payment_method: String,

        /// Charge the order right after placing it
        #[arg(long)]
        pay: bool,
    },
}

/// Initialize Sentry error tracking.
///
/// Returns a guard that must be kept alive for the duration of the program.
/// If `SENTRY_DSN` is not configured, returns `None` and Sentry is disabled.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            return ExitCode::from(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emporium_client=info,emporium_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let ctx = Context::new(config)?;

    match cli.command {
        Commands::Products { search } => commands::catalog::list(&ctx, search.as_deref()).await?,
        Commands::Product { id } => commands::catalog::show(&ctx, id).await?,
        Commands::Restock { id, quantity } => commands::catalog::restock(&ctx, id, quantity).await?,
        Commands::Register {
            email,
            first_name,
            last_name,
            phone,
            address,
        } => {
            let details = commands::account::NewAccount {
                email,
                first_name,
                last_name,
                phone,
                address,
            };
            commands::account::register(&ctx, details).await?;
        }
        Commands::Login { email } => commands::account::login(&ctx, &email).await?,
        Commands::Logout => commands::account::logout(&ctx).await,
        Commands::Whoami => commands::account::whoami(&ctx).await?,
        Commands::Orders => commands::orders::list(&ctx).await?,
        Commands::Order { id } => commands::orders::show(&ctx, id).await?,
        Commands::Checkout {
            items,
            shipping_address,
            payment_method,
            pay,
        } => {
            let checkout = commands::orders::Checkout {
                lines: items,
                shipping_address,
                payment_method,
                pay,
            };
            commands::orders::checkout(&ctx, checkout).await?;
        }
    }
    Ok(())
}
