//! Ambient plumbing shared by every Bazaar service: tracing setup, env-based
//! configuration helpers, the process shutdown signal and the HTTP bits every
//! router mounts.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod shutdown;
pub mod tracing;
