//! Maps a client name to its spreadsheet, creating it on first use.

use std::collections::HashMap;
use std::sync::Arc;

use caixa_core::{ClientName, ContainerId, FolderId, Sheet};
use tokio::sync::Mutex;

use crate::backend::StoreBackend;
use crate::client_store::ClientStore;
use crate::error::ProvisioningStep;
use crate::{Error, Result};

/// Outcome of [`Resolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Handle to the client's spreadsheet
    pub store: ClientStore,
    /// True if this call provisioned the spreadsheet
    pub created: bool,
}

/// Resolves client names to [`ClientStore`] handles.
///
/// Each client owns one spreadsheet titled with its name inside a fixed
/// parent folder. The first resolution of a name creates that spreadsheet
/// with the four worksheets in [`Sheet::ALL`] order; later resolutions find
/// and reuse it.
///
/// Resolutions of the same name are serialized within this resolver, so two
/// concurrent requests in one process cannot both create a spreadsheet.
/// Separate processes sharing a folder can still race.
pub struct Resolver {
    backend: Arc<dyn StoreBackend>,
    folder: FolderId,
    locks: Mutex<HashMap<ClientName, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("backend", &self.backend.name())
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver over `backend` rooted at `folder`.
    pub fn new(backend: Arc<dyn StoreBackend>, folder: FolderId) -> Self {
        Self {
            backend,
            folder,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Parent folder holding the client spreadsheets.
    pub fn folder(&self) -> &FolderId {
        &self.folder
    }

    /// The backend stores are resolved against.
    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// Finds the client's spreadsheet or provisions it.
    ///
    /// When lookup returns several spreadsheets the first one wins. An
    /// existing spreadsheet is returned as-is, even if an earlier
    /// provisioning stopped halfway.
    ///
    /// # Errors
    ///
    /// [`Error::Lookup`] if the search fails and [`Error::Provisioning`] if
    /// any creation step fails. Nothing is rolled back or retried.
    pub async fn resolve(&self, name: &ClientName) -> Result<Resolution> {
        let lock = self.lock_for(name).await;
        let result = {
            let _guard = lock.lock().await;
            self.resolve_locked(name).await
        };
        self.release(name, lock).await;
        result
    }

    async fn resolve_locked(&self, name: &ClientName) -> Result<Resolution> {
        let found = self
            .backend
            .find_containers(&self.folder, name.as_str())
            .await
            .map_err(|e| Error::lookup(name, e))?;

        if found.len() > 1 {
            tracing::warn!(client = %name, matches = found.len(), "several spreadsheets share this name; using the first");
        }

        if let Some(id) = found.into_iter().next() {
            let container = self
                .backend
                .open_container(&id)
                .await
                .map_err(|e| Error::lookup(name, e))?;
            tracing::debug!(client = %name, container_id = %container.id, "client store found");
            return Ok(Resolution {
                store: ClientStore::new(name.clone(), container.id, Arc::clone(&self.backend)),
                created: false,
            });
        }

        let id = self.provision(name).await?;
        tracing::info!(client = %name, container_id = %id, "client store provisioned");
        Ok(Resolution {
            store: ClientStore::new(name.clone(), id, Arc::clone(&self.backend)),
            created: true,
        })
    }

    async fn provision(&self, name: &ClientName) -> Result<ContainerId> {
        let fail = |step| move |e| Error::provisioning(name, step, e);

        let container = self
            .backend
            .create_container(name.as_str())
            .await
            .map_err(fail(ProvisioningStep::Create))?;

        self.backend
            .move_to_folder(&container.id, &self.folder)
            .await
            .map_err(fail(ProvisioningStep::MoveToFolder))?;

        for sheet in Sheet::ALL {
            self.backend
                .add_worksheet(&container.id, sheet.title())
                .await
                .map_err(fail(ProvisioningStep::AddWorksheet(sheet)))?;
            tracing::debug!(client = %name, sheet = %sheet, "worksheet added");
        }

        for placeholder in &container.worksheets {
            self.backend
                .remove_worksheet(&container.id, placeholder.id)
                .await
                .map_err(fail(ProvisioningStep::RemovePlaceholder))?;
        }

        Ok(container.id)
    }

    async fn lock_for(&self, name: &ClientName) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(name.clone()).or_default())
    }

    /// Drops the per-name lock once no other resolution holds or awaits it.
    async fn release(&self, name: &ClientName, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(name);
        }
    }
}
