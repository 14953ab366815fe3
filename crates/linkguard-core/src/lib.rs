//! Core domain + moderation logic for the link guard bot.
//!
//! This crate is framework-agnostic. The chat platform lives behind the
//! [`gateway::ChatGateway`] port, implemented in adapter crates.

pub mod cleanup;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod gateway;
pub mod logging;
pub mod pipeline;
pub mod policy;
pub mod url_matcher;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
