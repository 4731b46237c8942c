//! # cajero-db: Database Layer for Cajero POS
//!
//! Local SQLite storage for the terminal: catalogue, clients, issued
//! documents and the company profile. Async access through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cajero POS Data Flow                             │
//! │                                                                         │
//! │  Checkout orchestrator (apps/terminal)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cajero-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ClientRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial  │  │   │
//! │  │   │               │    │ DocumentRepo  │    │   _schema    │  │   │
//! │  │   │               │    │ CompanyRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (path from the [database] config section)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cajero_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cajero.db")).await?;
//! let catalogue = db.products().list().await?;
//! db.documents().create(&document).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::client::ClientRepository;
pub use repository::company::CompanyRepository;
pub use repository::document::DocumentRepository;
pub use repository::product::ProductRepository;
