//! # CLI Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── Terminal context (store, cart, clients, orchestrator)
//! ├── catalog.rs    ◄─── products, add-product, clients, add-client, lookup
//! ├── sale.rs       ◄─── sell
//! ├── documents.rs  ◄─── history, show, render, send
//! └── profile.rs    ◄─── profile show / set, init
//! ```
//!
//! ## Command Flow
//! ```text
//! main.rs ── clap ──► Terminal::open(config)
//!                         │
//!                         ├─ Database (SQLite) as RecordStore
//!                         ├─ company profile from the store
//!                         ├─ SimulatedGateway from [authority]
//!                         └─ ClientsState loaded from the store
//!                         │
//!                         ▼
//!                     run_<command>(&terminal, &args)
//! ```
//!
//! Handlers return `anyhow::Result` and print to stdout; logs go to stderr.

pub mod catalog;
pub mod documents;
pub mod profile;
pub mod sale;

use std::sync::Arc;

use anyhow::Context;
use cajero_core::CompanyProfile;
use cajero_db::{Database, DbConfig};
use cajero_sunat::{AuthorityGateway, SimulatedGateway};
use tracing::{info, warn};

use crate::checkout::Orchestrator;
use crate::config::TerminalConfig;
use crate::state::{CartState, ClientsState};
use crate::store::RecordStore;

pub use catalog::{
    run_add_client, run_add_product, run_clients, run_lookup, run_products, AddClientArgs,
    AddProductArgs, LookupArgs,
};
pub use documents::{run_history, run_render, run_send, run_show, DocumentRef, HistoryArgs, SendArgs};
pub use profile::{run_init, run_profile, ProfileArgs, ProfileCommand, ProfileSetArgs};
pub use sale::{parse_item, run_sell, SellArgs};

/// Everything a command may need, opened once per invocation.
pub struct Terminal {
    pub config: TerminalConfig,
    pub profile: CompanyProfile,
    pub cart: CartState,
    pub clients: ClientsState,
    pub orchestrator: Orchestrator,
}

impl Terminal {
    /// Opens the configured database and prepares the terminal state.
    pub async fn open(config: TerminalConfig) -> anyhow::Result<Self> {
        let path = config.database.resolve_path()?;
        let db = Database::new(
            DbConfig::new(&path).max_connections(config.database.max_connections),
        )
        .await
        .with_context(|| format!("opening database {}", path.display()))?;

        let gateway = SimulatedGateway::new(config.authority.clone())?;
        Self::with_parts(config, Arc::new(db), Arc::new(gateway)).await
    }

    /// Builds the terminal over an arbitrary store and gateway.
    pub async fn with_parts(
        config: TerminalConfig,
        store: Arc<dyn RecordStore>,
        gateway: Arc<dyn AuthorityGateway>,
    ) -> anyhow::Result<Self> {
        let profile = match store.load_profile().await? {
            Some(profile) => profile,
            None => {
                warn!("No company profile stored, installing the demo profile");
                let profile = CompanyProfile::demo();
                store.save_profile(&profile).await?;
                profile
            }
        };

        let clients = ClientsState::new();
        clients.replace_all(store.list_clients().await?);
        info!(
            ruc = %profile.ruc,
            environment = %config.authority.environment,
            clients = clients.len(),
            "Terminal ready"
        );

        Ok(Terminal {
            config,
            profile,
            cart: CartState::new(),
            clients,
            orchestrator: Orchestrator::new(store, gateway),
        })
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.orchestrator.store().as_ref()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::MemoryStore;
    use cajero_sunat::{FixedDecider, GatewayConfig};

    /// Terminal over a memory store and an instant gateway.
    pub async fn terminal(accept: bool) -> Terminal {
        let gateway =
            SimulatedGateway::with_decider(GatewayConfig::instant(), Arc::new(FixedDecider(accept)));
        Terminal::with_parts(
            TerminalConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(gateway),
        )
        .await
        .unwrap()
    }
}
