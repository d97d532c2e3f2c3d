//! # caixa-store
//!
//! Spreadsheet persistence for Caixa.
//!
//! - [`backend`]: the [`StoreBackend`] trait every backend implements
//! - [`google`]: Google Drive + Sheets backend with service-account auth
//! - [`memory`]: in-process backend for tests and local runs
//! - [`resolver`]: client name to spreadsheet resolution and provisioning
//! - [`client_store`]: per-client handle with whole-worksheet table access

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod client_store;
pub mod error;
pub mod google;
pub mod memory;
pub mod resolver;

pub use backend::{Container, StoreBackend, WorksheetRef};
pub use client_store::{ClientStore, RecordTable, TypedTable};
pub use error::{Error, ProvisioningStep, Result};
pub use google::{GoogleBackend, GoogleConfig};
pub use memory::MemoryBackend;
pub use resolver::{Resolution, Resolver};
