//! Shared helpers for integration tests.

pub mod neat_api;
