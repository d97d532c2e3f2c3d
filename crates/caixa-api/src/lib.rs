//! # caixa-api
//!
//! HTTP surface for Caixa: a JSON API over the client stores and the
//! server-rendered dashboard (cadastro screen, counterparties, yearly targets
//! and the balance view).
//!
//! - [`config`]: TOML configuration with `CAIXA_*` overrides
//! - [`router`]: axum router combining every route group
//! - [`state`]: resolver plus the client session registry
//! - [`views`]: HTML rendering

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;
pub mod views;

pub use config::CaixaConfig;
pub use error::{Error, Result};
pub use router::router;
pub use server::serve;
pub use state::{AppState, Sessions};
