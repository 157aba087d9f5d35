//! REST API module for Quarry.
//!
//! Exposes the pipeline over HTTP for dashboards and services that do not
//! want to link the crate directly.

mod handlers;
mod rest;

pub use handlers::*;
pub use rest::*;
