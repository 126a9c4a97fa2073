//! Enlist registration server library.
//!
//! This crate provides signup and email confirmation as a library, allowing
//! the router and service to be tested with in-memory stores and reused by
//! the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
