//! services/api/src/lib.rs
//!
//! The library crate backing the `api` binary, exposed so that integration
//! tests can build the router without starting a server.

pub mod adapters;
pub mod config;
pub mod error;
pub mod report;
pub mod web;
