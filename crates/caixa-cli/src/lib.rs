//! # caixa-cli
//!
//! The `caixa` binary: runs the server, resolves clients and prints balances
//! from the command line, and manages the configuration file.

#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod error;

pub use error::{Error, Result};
