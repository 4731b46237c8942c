//! # cajero-core: Pure Fiscal Logic for Cajero POS
//!
//! This crate is the **heart** of Cajero POS: the fiscal document engine,
//! written as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cajero POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/terminal                                │   │
//! │  │    Cart ──► Checkout orchestrator ──► Integrations ──► CLI      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cajero-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │    tax    │  │ numbering │  │    ubl    │  │   │
//! │  │   │ Document  │  │ compute_  │  │  assign   │  │  render   │  │   │
//! │  │   │  Client   │  │  totals   │  │  series   │  │  digest   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   money · summary · validation · error                         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼──────────┐  ┌──────────────────────┐  │
//! │  │  cajero-db (SQLite repositories)       │  │ cajero-sunat (submit)│  │
//! │  └────────────────────────────────────────┘  └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Document, Client, catalogue enums)
//! - [`money`] - Integer céntimos and the single rounding step
//! - [`tax`] - IGV apportionment calculator
//! - [`numbering`] - Series and correlative assignment
//! - [`ubl`] - UBL 2.1 XML serializer
//! - [`summary`] - QR summary payload
//! - [`validation`] - Checkout preconditions and input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cajero_core::money::Money;
//! use cajero_core::tax::compute_totals;
//! use cajero_core::types::{LineItem, TaxCategory, UnitCode};
//! use rust_decimal::Decimal;
//!
//! let line = LineItem {
//!     product_id: "p-1".to_string(),
//!     description: "Arroz Costeño 5kg".to_string(),
//!     unit_price: Money::from_cents(11800), // S/ 118.00, IGV included
//!     quantity: 1,
//!     tax_category: TaxCategory::Taxed,
//!     unit_code: UnitCode::Niu,
//! };
//!
//! let totals = compute_totals(&[line]).rounded();
//! assert_eq!(totals.taxed_base, Decimal::new(10000, 2));
//! assert_eq!(totals.tax_amount, Decimal::new(1800, 2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod summary;
pub mod tax;
pub mod types;
pub mod ubl;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::{SeriesNumber, SALE_NOTE_SERIES};
pub use tax::{compute_totals, TaxBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price in céntimos (S/ 1,000,000.00).
///
/// Keeps `MAX_PRICE_CENTS × MAX_ITEM_QUANTITY × MAX_CART_ITEMS` well inside
/// `i64`, so totals of validated lines cannot overflow.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;
