//! Libro de Reclamaciones Core - Shared types library.
//!
//! This crate provides common types used across the backend components:
//! - `server` - Public claim submission API and admin panel API
//! - `cli` - Command-line tools for migrations and admin management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, claim numbers, emails,
//!   and the status/classification enums of the complaint book domain.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
