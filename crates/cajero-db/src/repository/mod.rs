//! # Repository Module
//!
//! Database repository implementations for Cajero POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Checkout orchestrator (through the terminal's RecordStore)            │
//! │       │                                                                 │
//! │       │  db.documents().create(&document)                              │
//! │       ▼                                                                 │
//! │  DocumentRepository                                                    │
//! │  ├── create(&self, document)        one transaction with its items    │
//! │  ├── list(&self)                                                      │
//! │  ├── list_by_kind(&self, kind)                                        │
//! │  ├── max_correlative(&self, kind)                                     │
//! │  └── find_by_number(&self, series, n)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`](client::ClientRepository) - Clients
//! - [`ProductRepository`](product::ProductRepository) - Catalogue
//! - [`DocumentRepository`](document::DocumentRepository) - Issued documents
//! - [`CompanyRepository`](company::CompanyRepository) - Singleton company profile

pub mod client;
pub mod company;
pub mod document;
pub mod product;

use chrono::Utc;

/// Row timestamp, RFC 3339 in UTC.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}
