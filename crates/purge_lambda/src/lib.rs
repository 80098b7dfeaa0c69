//! AWS-oriented adapters and handlers for cache-invalidation dispatch.
//!
//! This crate owns runtime integration details (the Lambda handler and the
//! CDN/edge API adapters) and exposes a single runtime module boundary for
//! the notification contract, target builders, and configuration primitives.

pub mod adapters;
pub mod handlers;
pub mod runtime;
