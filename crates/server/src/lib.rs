//! Folio server library.
//!
//! A personal portfolio site: a public profile with project cards, an AI
//! assistant that can look the projects up, and an admin panel where a
//! single configured account manages them.
//!
//! Built as a library so the binary, the CLI and the integration tests share
//! one router and one set of services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod claude;
pub mod config;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod profile;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use app::build_router;
