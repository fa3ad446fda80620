//! Core domain + application logic for the Nexo dual investment bot.
//!
//! This crate is framework-agnostic. Telegram and the market data provider
//! live behind ports (traits) implemented in adapter crates.

pub mod analysis;
pub mod calculator;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod market;
pub mod messaging;
pub mod service;

pub use errors::{Error, Result};
