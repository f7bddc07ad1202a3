//! Core domain + application logic for the tally bot.
//!
//! This crate is framework-agnostic. The JSONBin store and the Telegram API
//! live behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod registry;
pub mod store;
pub mod update;

pub use errors::{Error, Result};
