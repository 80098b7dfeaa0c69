//! Runtime-facing re-exports of the shared domain primitives.

pub use purge_core::{config, contract, targets};
