//! # cajero-sunat: Authority Submission for Cajero POS
//!
//! Turns a finished document into the authority's verdict. The transport is
//! simulated: the UBL document is rendered for real, the `sendBill` call is
//! not made, and acceptance comes from an injectable [`AcceptanceDecider`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cajero_sunat::{AuthorityGateway, GatewayConfig, SimulatedGateway};
//!
//! let gateway = SimulatedGateway::new(GatewayConfig::default())?;
//! let response = gateway.submit(&document, &profile).await?;
//! document.record_response(&response)?;
//! ```

pub mod config;
pub mod decider;
pub mod error;
pub mod gateway;

pub use config::{Environment, GatewayConfig};
pub use decider::{AcceptanceDecider, FixedDecider, RandomDecider};
pub use error::{SubmissionError, SubmissionResult};
pub use gateway::{AuthorityGateway, SimulatedGateway};
