//! Listing Desk Core - Shared types library.
//!
//! This crate provides the records used across all Listing Desk components:
//! - `desk` - Marketplace client, identification pipeline, local store and controller
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no randomness. Every record here is flat and JSON-serializable so
//! it can be persisted as a blob under a fixed key.
//!
//! # Modules
//!
//! - [`types`] - Credentials, tokens, listings, drafts, identifications, prices, statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
