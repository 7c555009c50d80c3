//! Clever platform API models
//!
//! Serde types shared by the CLI for the REST endpoints and the live streams.

pub mod models;
