//! # Wiz GraphQL Proxy Library
//!
//! A reverse proxy in front of a single GraphQL API that authenticates with
//! the OAuth2 client-credentials grant, caches the bearer token until shortly
//! before it expires, and forwards requests with that token attached.
//!
//! Modules:
//! - `cache`: cached credential and the coalescing token cache
//! - `sources`: OAuth2 client-credentials token source
//! - `proxy`: GraphQL forwarding, health and CORS handlers
//! - `config`: CLI flags, YAML settings and validation
//! - `server`: axum server wiring and graceful shutdown

pub mod cache;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::token_cache::TokenCache;
pub use crate::config::service::ServiceConfig;
