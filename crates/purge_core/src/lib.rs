//! Shared cache-invalidation domain primitives.
//!
//! This crate owns the inbound notification contract, the outbound
//! invalidation and purge request contracts, and the environment-derived
//! dispatcher configuration. It intentionally excludes AWS SDK and Lambda
//! runtime concerns.

pub mod config;
pub mod contract;
pub mod targets;
