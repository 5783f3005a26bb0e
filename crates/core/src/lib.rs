//! Aurelia Core - Shared types library.
//!
//! This crate provides the types shared by all Aurelia components:
//! - `storefront` - JSON API and the indexed entity store behind it
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no storage,
//! no HTTP. Cart quantity rules and order totals live here so they can be
//! tested without a store.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices, and the persisted record shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
