//! Shared state for the HTTP handlers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use caixa_core::ClientName;
use caixa_store::{ClientStore, Resolution, Resolver};

use crate::Result;

/// Client stores already resolved by this server, keyed by client name.
///
/// A request naming a client that is not bound yet (a fresh browser, or a
/// bookmarked `?cliente=` link after a restart) resolves it again and binds
/// the result.
#[derive(Debug, Clone, Default)]
pub struct Sessions {
    bound: Arc<RwLock<HashMap<ClientName, ClientStore>>>,
}

impl Sessions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bound to `name`, if any.
    pub fn get(&self, name: &ClientName) -> Option<ClientStore> {
        self.bound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Binds a store under its client name, replacing any previous binding.
    pub fn bind(&self, store: ClientStore) {
        self.bound
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(store.name().clone(), store);
    }

    /// Drops the binding for `name`. Returns whether one existed.
    pub fn forget(&self, name: &ClientName) -> bool {
        self.bound
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Number of bound clients.
    pub fn len(&self) -> usize {
        self.bound.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client name to spreadsheet resolution
    pub resolver: Arc<Resolver>,
    /// Bound client stores
    pub sessions: Sessions,
}

impl AppState {
    /// Creates state around a resolver with no bound clients.
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            sessions: Sessions::new(),
        }
    }

    /// Resolves `name` and binds the store.
    pub async fn enter(&self, name: &ClientName) -> Result<Resolution> {
        let resolution = self.resolver.resolve(name).await?;
        self.sessions.bind(resolution.store.clone());
        Ok(resolution)
    }

    /// The bound store for `name`, resolving it first if needed.
    pub async fn store_for(&self, name: &ClientName) -> Result<ClientStore> {
        if let Some(store) = self.sessions.get(name) {
            return Ok(store);
        }
        Ok(self.enter(name).await?.store)
    }
}
