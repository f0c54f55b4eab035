//! Libro de Reclamaciones - complaint book backend.
//!
//! Public API for filing consumer claims (multi-step form with
//! attachments, PDF receipt, confirmation email) and an authenticated
//! admin API for triage: listing and filtering, written responses by
//! email, status changes with an audit trail, CSV export, and dashboard
//! statistics.
//!
//! # Modules
//!
//! - [`config`] - Environment-based configuration
//! - [`db`] - `SQLite` repositories
//! - [`models`] - Domain models
//! - [`services`] - Storage, PDF rendering, email, caching, submission pipeline
//! - [`routes`] - HTTP handlers and router assembly
//! - [`middleware`] - Bearer-token authentication extractors
//! - [`validation`] - Form field and file validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
