//! Folio Core - Shared domain types.
//!
//! This crate provides the types used across all Folio components:
//! - `server` - Public profile page, assistant, and admin panel
//! - `cli` - Command-line tools for migrations and bulk project management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Storage backends and the assistant live in the
//! server crate.
//!
//! # Modules
//!
//! - [`types`] - Project entity, admin form validation, identities, questions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
