//! # cajero CLI entry point
//!
//! Parses arguments, sets up tracing and configuration, opens the terminal
//! and dispatches to the command handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cajero_terminal::commands::{
    run_add_client, run_add_product, run_clients, run_history, run_init, run_lookup,
    run_products, run_profile, run_render, run_sell, run_send, run_show, AddClientArgs,
    AddProductArgs, DocumentRef, HistoryArgs, LookupArgs, ProfileArgs, SellArgs, SendArgs,
    Terminal,
};
use cajero_terminal::TerminalConfig;

/// Cajero POS checkout terminal
///
/// Issues invoices, receipts and sale notes, submits them to the tax
/// authority (simulated) and keeps the history in a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "cajero", version, about, long_about = None)]
struct Cli {
    /// Verbose logging. Repeat for more (-v, -vv). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init {
        #[arg(long)]
        force: bool,
    },

    /// List the product catalogue.
    Products,

    /// Add a product to the catalogue.
    AddProduct(AddProductArgs),

    /// List registered clients.
    Clients,

    /// Register a client, looking up the name by DNI/RUC when not given.
    AddClient(AddClientArgs),

    /// Look up a DNI or RUC with the identity provider.
    Lookup(LookupArgs),

    /// Sell: fill the cart and check out.
    Sell(SellArgs),

    /// List issued documents, newest first.
    History(HistoryArgs),

    /// Show one document.
    Show(DocumentRef),

    /// Print the UBL XML of one document.
    Render(DocumentRef),

    /// Send a document to the client by chat.
    Send(SendArgs),

    /// Show or update the company profile.
    Profile(ProfileArgs),
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info,cajero=debug,sqlx=warn"),
        1 => EnvFilter::new("debug,sqlx=warn"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn open(config_path: Option<PathBuf>) -> anyhow::Result<Terminal> {
    let config = TerminalConfig::load(config_path)?;
    Terminal::open(config).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        verbose,
        config,
        command,
    } = Cli::parse();
    init_tracing(verbose);
    debug!(version = env!("CARGO_PKG_VERSION"), "cajero starting");

    match command {
        Commands::Init { force } => run_init(config, force),
        Commands::Products => run_products(&open(config).await?).await,
        Commands::AddProduct(args) => {
            run_add_product(&open(config).await?, args).await.map(|_| ())
        }
        Commands::Clients => run_clients(&open(config).await?).await,
        Commands::AddClient(args) => run_add_client(&open(config).await?, args).await,
        Commands::Lookup(args) => run_lookup(&open(config).await?, &args).await,
        Commands::Sell(args) => run_sell(&open(config).await?, &args).await.map(|_| ()),
        Commands::History(args) => run_history(&open(config).await?, &args).await,
        Commands::Show(doc_ref) => run_show(&open(config).await?, &doc_ref).await,
        Commands::Render(doc_ref) => run_render(&open(config).await?, &doc_ref).await,
        Commands::Send(args) => run_send(&open(config).await?, &args).await,
        Commands::Profile(args) => run_profile(&mut open(config).await?, args).await,
    }
}
