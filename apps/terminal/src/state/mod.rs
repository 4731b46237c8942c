//! # Terminal State
//!
//! In-memory state shared by the CLI commands and the checkout orchestrator.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  CartState     Arc<Mutex<>>  │ ◄── sell command fills it, checkout clears it
//! │  ClientsState  Arc<Mutex<>>  │ ◄── loaded from the store, optimistic creates
//! └──────────────────────────────┘
//! ```
//!
//! Locks are `std::sync::Mutex` and are only held inside closures, never
//! across an `.await`.

pub mod cart;
pub mod clients;

pub use cart::{Cart, CartItem, CartState, CartTotals};
pub use clients::ClientsState;
