//! Core data models for the bucket usage exporter.
//!
//! These entities are created fresh on every collection run and serialize
//! naturally as JSON via `serde`.

pub mod account;
pub mod bucket;
pub mod snapshot;
