//! # Cajero Terminal
//!
//! Checkout terminal for Cajero POS: cart, client directory, checkout
//! orchestration and the command line around them.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cajero Terminal                                  │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │  main.rs: clap CLI, tracing, TerminalConfig::load                 │ │
//! │  └───────────────────────────────┬───────────────────────────────────┘ │
//! │                                  │                                      │
//! │  ┌───────────────────────────────▼───────────────────────────────────┐ │
//! │  │  commands/  (Terminal context + one handler per subcommand)       │ │
//! │  └──────┬─────────────────┬──────────────────┬───────────────────────┘ │
//! │         │                 │                  │                          │
//! │  ┌──────▼──────┐  ┌───────▼────────┐  ┌──────▼──────────────┐          │
//! │  │   state/    │  │  checkout.rs   │  │  integrations/      │          │
//! │  │ CartState   │  │  Orchestrator  │  │  IdentityLookup     │          │
//! │  │ ClientsState│  │  SeriesLocks   │  │  MessageDispatcher  │          │
//! │  └─────────────┘  └───┬────────┬───┘  └─────────────────────┘          │
//! │                       │        │                                        │
//! │              ┌────────▼──┐  ┌──▼────────────────┐                       │
//! │              │ store.rs  │  │ cajero-sunat      │                       │
//! │              │RecordStore│  │ AuthorityGateway  │                       │
//! │              └────┬──────┘  └───────────────────┘                       │
//! │                   │                                                     │
//! │          cajero-db (SQLite) / MemoryStore                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//! - `checkout`: the checkout state machine and per-series numbering locks
//! - `commands`: CLI handlers
//! - `config`: `TerminalConfig` (file + `CAJERO_*` environment)
//! - `error`: `CheckoutError`, `StoreError`, `IntegrationError`, `ConfigError`
//! - `integrations`: identity lookup and chat delivery
//! - `state`: cart and client directory
//! - `store`: the `RecordStore` seam

pub mod checkout;
pub mod commands;
pub mod config;
pub mod error;
pub mod integrations;
pub mod state;
pub mod store;

pub use checkout::{CheckoutRequest, CheckoutState, Orchestrator};
pub use config::TerminalConfig;
pub use error::{CheckoutError, ConfigError, IntegrationError, StoreError};
pub use store::{MemoryStore, RecordStore};
