//! Pick'n'Go CLI - Cart panel on the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart for a user
//! pickngo --user alice list
//!
//! # Total of some rows
//! pickngo --user alice total --item 3 --item 7
//!
//! # Remove rows
//! pickngo --user alice remove 3 7
//!
//! # Check out every row, identity taken from the storefront session blob
//! pickngo --session-json '{"name":"alice"}' checkout --all
//! ```
//!
//! # Commands
//!
//! - `list` - Show the cart
//! - `total` - Show the total of the given rows
//! - `remove` - Delete rows from the cart
//! - `checkout` - Record transactions for the given rows and clear them from the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pickngo_cart::{CartConfig, CartView, CurrentUser, RestClient, SessionError};
use pickngo_core::CartItemId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CliError, ItemSelection};

#[derive(Parser)]
#[command(name = "pickngo")]
#[command(author, version, about = "Pick'n'Go cart tools")]
struct Cli {
    /// User whose cart to open
    #[arg(short, long, global = true, env = "PICKNGO_SESSION_USER")]
    user: Option<String>,

    /// Storefront session user blob, e.g. '{"name":"alice"}'
    #[arg(long, global = true, conflicts_with = "user")]
    session_json: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    List,
    /// Show the total of the selected rows
    Total {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Delete rows from the cart
    Remove {
        /// Cart item ids to delete
        #[arg(required = true)]
        ids: Vec<CartItemId>,
    },
    /// Record transactions for the selected rows and clear them from the cart
    Checkout {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// Cart item id to select (repeatable)
    #[arg(short, long = "item", conflicts_with = "all")]
    items: Vec<CartItemId>,

    /// Select every row
    #[arg(short, long)]
    all: bool,
}

impl From<SelectionArgs> for ItemSelection {
    fn from(args: SelectionArgs) -> Self {
        if args.all {
            Self::All
        } else {
            Self::Ids(args.items)
        }
    }
}

impl Cli {
    /// Resolve the session user from `--user` or `--session-json`.
    fn current_user(&self) -> Result<CurrentUser, SessionError> {
        match (&self.user, &self.session_json) {
            (Some(name), _) => CurrentUser::from_name(name),
            (None, raw) => CurrentUser::from_session_json(raw.as_deref()),
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
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
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration is needed for Sentry, which must start before tracing
    let config = CartConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pickngo=info,pickngo_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(CliError::from(pickngo_cart::CartError::from(e))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), CliError> {
    let user = cli.current_user().map_err(pickngo_cart::CartError::from)?;
    let client = RestClient::new(config).map_err(pickngo_cart::CartError::from)?;
    let view = CartView::new(user, client.clone(), client).with_currency(config.currency);

    let user = view.user();
    pickngo_cart::error::set_sentry_user(user.name.as_str(), user.email.as_deref());
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::List => commands::list(&view, &mut out).await,
        Commands::Total { selection } => commands::total(&view, selection.into(), &mut out).await,
        Commands::Remove { ids } => commands::remove(&view, &ids, &mut out).await,
        Commands::Checkout { selection } => {
            commands::checkout(&view, selection.into(), &mut out).await
        }
    }
}
