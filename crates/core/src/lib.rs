//! Domain core for the fiscal device registry.
//!
//! Pure classification, filtering, aggregation, and access policy, plus the
//! import reconciliation and registry operations that run against any
//! [`store::RegistryStore`]. No database or HTTP types appear here.

pub mod access;
pub mod classifier;
pub mod clock;
pub mod dashboard;
pub mod device;
pub mod error;
pub mod filter;
pub mod importer;
pub mod memory_store;
pub mod operator;
pub mod registry;
pub mod roles;
pub mod store;
pub mod types;
pub mod user;
