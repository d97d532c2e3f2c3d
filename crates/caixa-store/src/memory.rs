//! In-process store backend.
//!
//! Mimics the parts of Google Drive and Sheets the resolver relies on: new
//! spreadsheets start in `root` with a single `Sheet1` worksheet, lookups
//! skip trashed files, and writes replace the whole worksheet. Every call is
//! recorded so tests can assert which side effects happened, and any
//! operation can be made to fail once.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use async_trait::async_trait;
use caixa_core::{ContainerId, FolderId, WorksheetId};
use uuid::Uuid;

use crate::backend::{Container, StoreBackend, WorksheetRef};
use crate::{Error, Result};

/// Title of the worksheet a fresh spreadsheet starts with.
pub const PLACEHOLDER_WORKSHEET: &str = "Sheet1";

/// Parent a fresh spreadsheet starts in.
pub const ROOT_FOLDER: &str = "root";

/// Backend operations, for the call log and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`StoreBackend::find_containers`]
    Find,
    /// [`StoreBackend::create_container`]
    Create,
    /// [`StoreBackend::move_to_folder`]
    Move,
    /// [`StoreBackend::open_container`]
    Open,
    /// [`StoreBackend::add_worksheet`]
    AddWorksheet,
    /// [`StoreBackend::remove_worksheet`]
    RemoveWorksheet,
    /// [`StoreBackend::read_values`]
    Read,
    /// [`StoreBackend::write_values`]
    Write,
}

impl Operation {
    /// True for operations that change backend state.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::Create
                | Operation::Move
                | Operation::AddWorksheet
                | Operation::RemoveWorksheet
                | Operation::Write
        )
    }

    fn label(self) -> &'static str {
        match self {
            Operation::Find => "find_containers",
            Operation::Create => "create_container",
            Operation::Move => "move_to_folder",
            Operation::Open => "open_container",
            Operation::AddWorksheet => "add_worksheet",
            Operation::RemoveWorksheet => "remove_worksheet",
            Operation::Read => "read_values",
            Operation::Write => "write_values",
        }
    }
}

#[derive(Debug, Clone)]
struct StoredWorksheet {
    id: WorksheetId,
    title: String,
    grid: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
struct StoredContainer {
    name: String,
    parents: Vec<FolderId>,
    trashed: bool,
    worksheets: Vec<StoredWorksheet>,
}

impl StoredContainer {
    fn to_container(&self, id: &ContainerId) -> Container {
        Container {
            id: id.clone(),
            name: self.name.clone(),
            worksheets: self
                .worksheets
                .iter()
                .map(|w| WorksheetRef {
                    id: w.id,
                    title: w.title.clone(),
                })
                .collect(),
        }
    }

    fn worksheet_mut(&mut self, title: &str) -> Result<&mut StoredWorksheet> {
        self.worksheets
            .iter_mut()
            .find(|w| w.title == title)
            .ok_or_else(|| Error::NotFound(format!("worksheet '{title}'")))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    containers: HashMap<ContainerId, StoredContainer>,
    /// Creation order, which is the order lookups report matches in.
    order: Vec<ContainerId>,
    next_worksheet_id: i64,
    calls: VecDeque<Operation>,
    fail_next: HashSet<Operation>,
}

/// Most recent operations kept in the call log.
pub const CALL_LOG_CAPACITY: usize = 4096;

/// Store backend that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `operation` fail with a backend error.
    pub fn fail_next(&self, operation: Operation) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next.insert(operation);
        }
    }

    /// Operations called so far, oldest first, capped at
    /// [`CALL_LOG_CAPACITY`].
    pub fn calls(&self) -> Vec<Operation> {
        self.state
            .read()
            .map(|state| state.calls.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Forgets the call log.
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.write() {
            state.calls.clear();
        }
    }

    /// Parents of a spreadsheet.
    pub fn parents(&self, id: &ContainerId) -> Vec<FolderId> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.containers.get(id).map(|c| c.parents.clone()))
            .unwrap_or_default()
    }

    /// Marks a spreadsheet as trashed so lookups no longer see it.
    pub fn trash(&self, id: &ContainerId) {
        if let Ok(mut state) = self.state.write() {
            if let Some(container) = state.containers.get_mut(id) {
                container.trashed = true;
            }
        }
    }

    /// Number of spreadsheets, trashed ones included.
    pub fn container_count(&self) -> usize {
        self.state
            .read()
            .map(|state| state.containers.len())
            .unwrap_or_default()
    }

    /// Records the call and consumes an injected failure, if any.
    fn enter(&self, operation: Operation) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        let mut state = self
            .state
            .write()
            .map_err(|_| Error::backend(operation.label(), "lock poisoned"))?;
        if state.calls.len() == CALL_LOG_CAPACITY {
            state.calls.pop_front();
        }
        state.calls.push_back(operation);
        if state.fail_next.remove(&operation) {
            return Err(Error::backend(operation.label(), "injected failure"));
        }
        Ok(state)
    }
}

fn container_mut<'a>(
    state: &'a mut MemoryState,
    id: &ContainerId,
) -> Result<&'a mut StoredContainer> {
    state
        .containers
        .get_mut(id)
        .ok_or_else(|| Error::NotFound(format!("spreadsheet '{id}'")))
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_containers(&self, folder: &FolderId, name: &str) -> Result<Vec<ContainerId>> {
        let state = self.enter(Operation::Find)?;
        Ok(state
            .order
            .iter()
            .filter(|id| {
                state.containers.get(*id).is_some_and(|c| {
                    !c.trashed && c.name == name && c.parents.iter().any(|p| p == folder)
                })
            })
            .cloned()
            .collect())
    }

    async fn create_container(&self, name: &str) -> Result<Container> {
        let mut state = self.enter(Operation::Create)?;
        let id = ContainerId::new(Uuid::new_v4().simple().to_string());
        let worksheet_id = WorksheetId(state.next_worksheet_id);
        state.next_worksheet_id += 1;

        let stored = StoredContainer {
            name: name.to_string(),
            parents: vec![FolderId::new(ROOT_FOLDER)],
            trashed: false,
            worksheets: vec![StoredWorksheet {
                id: worksheet_id,
                title: PLACEHOLDER_WORKSHEET.to_string(),
                grid: Vec::new(),
            }],
        };
        let container = stored.to_container(&id);
        state.containers.insert(id.clone(), stored);
        state.order.push(id);
        Ok(container)
    }

    async fn move_to_folder(&self, id: &ContainerId, folder: &FolderId) -> Result<()> {
        let mut state = self.enter(Operation::Move)?;
        let container = container_mut(&mut state, id)?;
        container.parents = vec![folder.clone()];
        Ok(())
    }

    async fn open_container(&self, id: &ContainerId) -> Result<Container> {
        let mut state = self.enter(Operation::Open)?;
        let container = container_mut(&mut state, id)?;
        Ok(container.to_container(id))
    }

    async fn add_worksheet(&self, id: &ContainerId, title: &str) -> Result<WorksheetRef> {
        let mut state = self.enter(Operation::AddWorksheet)?;
        let worksheet_id = WorksheetId(state.next_worksheet_id);
        let container = container_mut(&mut state, id)?;
        if container.worksheets.iter().any(|w| w.title == title) {
            return Err(Error::backend(
                Operation::AddWorksheet.label(),
                format!("a sheet with the name '{title}' already exists"),
            ));
        }
        container.worksheets.push(StoredWorksheet {
            id: worksheet_id,
            title: title.to_string(),
            grid: Vec::new(),
        });
        state.next_worksheet_id += 1;
        Ok(WorksheetRef {
            id: worksheet_id,
            title: title.to_string(),
        })
    }

    async fn remove_worksheet(&self, id: &ContainerId, worksheet: WorksheetId) -> Result<()> {
        let mut state = self.enter(Operation::RemoveWorksheet)?;
        let container = container_mut(&mut state, id)?;
        if container.worksheets.len() == 1 {
            return Err(Error::backend(
                Operation::RemoveWorksheet.label(),
                "cannot remove the only worksheet",
            ));
        }
        let before = container.worksheets.len();
        container.worksheets.retain(|w| w.id != worksheet);
        if container.worksheets.len() == before {
            return Err(Error::NotFound(format!("worksheet id {worksheet}")));
        }
        Ok(())
    }

    async fn read_values(&self, id: &ContainerId, worksheet: &str) -> Result<Vec<Vec<String>>> {
        let mut state = self.enter(Operation::Read)?;
        let container = container_mut(&mut state, id)?;
        Ok(container.worksheet_mut(worksheet)?.grid.clone())
    }

    async fn write_values(
        &self,
        id: &ContainerId,
        worksheet: &str,
        grid: &[Vec<String>],
    ) -> Result<()> {
        let mut state = self.enter(Operation::Write)?;
        let container = container_mut(&mut state, id)?;
        container.worksheet_mut(worksheet)?.grid = grid.to_vec();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn folder() -> FolderId {
        FolderId::new("clients")
    }

    #[tokio::test]
    async fn test_new_container_starts_in_root_with_placeholder() {
        let backend = MemoryBackend::new();
        let container = backend.create_container("Acme").await.unwrap();

        assert_eq!(container.name, "Acme");
        assert_eq!(container.worksheet_titles(), [PLACEHOLDER_WORKSHEET]);
        assert_eq!(backend.parents(&container.id), [FolderId::new(ROOT_FOLDER)]);
    }

    #[tokio::test]
    async fn test_find_requires_folder_exact_name_and_not_trashed() {
        let backend = MemoryBackend::new();
        let container = backend.create_container("Acme").await.unwrap();
        assert!(backend.find_containers(&folder(), "Acme").await.unwrap().is_empty());

        backend.move_to_folder(&container.id, &folder()).await.unwrap();
        assert_eq!(
            backend.find_containers(&folder(), "Acme").await.unwrap(),
            [container.id.clone()]
        );
        assert!(backend.find_containers(&folder(), "acme").await.unwrap().is_empty());

        backend.trash(&container.id);
        assert!(backend.find_containers(&folder(), "Acme").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_worksheet_lifecycle() {
        let backend = MemoryBackend::new();
        let container = backend.create_container("Acme").await.unwrap();
        let placeholder = container.worksheets[0].id;

        backend.add_worksheet(&container.id, "Receitas").await.unwrap();
        assert!(backend.add_worksheet(&container.id, "Receitas").await.is_err());

        backend.remove_worksheet(&container.id, placeholder).await.unwrap();
        let opened = backend.open_container(&container.id).await.unwrap();
        assert_eq!(opened.worksheet_titles(), ["Receitas"]);

        let only = opened.worksheets[0].id;
        assert!(backend.remove_worksheet(&container.id, only).await.is_err());
    }

    #[tokio::test]
    async fn test_write_replaces_grid() {
        let backend = MemoryBackend::new();
        let container = backend.create_container("Acme").await.unwrap();
        let grid = vec![vec!["a".to_string()], vec!["b".to_string()]];

        backend.write_values(&container.id, "Sheet1", &grid).await.unwrap();
        backend
            .write_values(&container.id, "Sheet1", &grid[..1])
            .await
            .unwrap();

        let read = backend.read_values(&container.id, "Sheet1").await.unwrap();
        assert_eq!(read, grid[..1]);
        assert!(backend.read_values(&container.id, "Nope").await.is_err());
    }

    #[tokio::test]
    async fn test_fail_next_fails_once_and_is_logged() {
        let backend = MemoryBackend::new();
        backend.fail_next(Operation::Create);

        assert!(backend.create_container("Acme").await.is_err());
        assert!(backend.create_container("Acme").await.is_ok());
        assert_eq!(backend.calls(), [Operation::Create, Operation::Create]);
        assert_eq!(backend.container_count(), 1);
    }

    #[tokio::test]
    async fn test_call_log_keeps_most_recent() {
        let backend = MemoryBackend::new();
        let folder = FolderId::new("clients");
        for _ in 0..CALL_LOG_CAPACITY {
            backend.find_containers(&folder, "Acme").await.unwrap();
        }
        backend.create_container("Acme").await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert_eq!(calls.last(), Some(&Operation::Create));
    }
}
