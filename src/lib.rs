//! consoleauth — issues and checks short-lived VM console access tokens.
//!
//! Tokens live in a TTL cache (`cache`), are indexed per instance for bulk
//! revocation (`store`) and are confirmed against the compute service or the
//! cell router (`rpc`) before being honoured (`manager`).

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod manager;
pub mod models;
pub mod rpc;
pub mod store;

pub use manager::ConsoleAuthManager;
