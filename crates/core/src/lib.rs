//! Enlist Core - Shared types library.
//!
//! This crate provides common types used across all Enlist components:
//! - `server` - Registration and email-confirmation HTTP service
//! - `cli` - Command-line tools for migrations and maintenance
//! - `integration-tests` - In-memory collaborators and black-box tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure predicates - no I/O, no database
//! access, no mail transport. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, IDs, tokens, and lifecycle states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
