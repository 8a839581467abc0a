//! Core domain + application logic for the Kindle courier bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / SMTP live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod ports;
pub mod relay;
pub mod session;
pub mod watchdog;

pub use errors::{Error, Result};
