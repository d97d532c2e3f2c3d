//! Store backend trait.
//!
//! A backend keeps spreadsheets ("containers") made of named worksheets, each
//! holding a grid of text cells. Two implementations exist:
//!
//! - [`GoogleBackend`](crate::google::GoogleBackend): Google Drive + Sheets
//! - [`MemoryBackend`](crate::memory::MemoryBackend): in-process, for tests
//!   and local runs

use async_trait::async_trait;
use caixa_core::{ContainerId, FolderId, WorksheetId};

use crate::Result;

/// A worksheet inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetRef {
    /// Backend id
    pub id: WorksheetId,
    /// Title shown on the tab
    pub title: String,
}

/// An opened spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Backend id
    pub id: ContainerId,
    /// Spreadsheet title
    pub name: String,
    /// Worksheets in tab order
    pub worksheets: Vec<WorksheetRef>,
}

impl Container {
    /// Titles of the worksheets in tab order.
    pub fn worksheet_titles(&self) -> Vec<&str> {
        self.worksheets.iter().map(|w| w.title.as_str()).collect()
    }
}

/// Tabular persistence service addressed by spreadsheet and worksheet.
///
/// Every call is one round trip to the backend. There is no native append or
/// conditional write: callers read a whole worksheet, change it, and write it
/// back with [`write_values`](StoreBackend::write_values).
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Ids of non-trashed spreadsheets titled exactly `name` in `folder`,
    /// in backend order.
    async fn find_containers(&self, folder: &FolderId, name: &str) -> Result<Vec<ContainerId>>;

    /// Creates a spreadsheet with the backend's default worksheet(s).
    async fn create_container(&self, name: &str) -> Result<Container>;

    /// Moves a spreadsheet into `folder`, detaching it from its current
    /// parents.
    async fn move_to_folder(&self, id: &ContainerId, folder: &FolderId) -> Result<()>;

    /// Opens a spreadsheet by id.
    async fn open_container(&self, id: &ContainerId) -> Result<Container>;

    /// Adds a worksheet at the end of the tab list.
    async fn add_worksheet(&self, id: &ContainerId, title: &str) -> Result<WorksheetRef>;

    /// Removes a worksheet.
    async fn remove_worksheet(&self, id: &ContainerId, worksheet: WorksheetId) -> Result<()>;

    /// Reads every row of a worksheet. Trailing blank cells may be omitted.
    async fn read_values(&self, id: &ContainerId, worksheet: &str) -> Result<Vec<Vec<String>>>;

    /// Replaces the contents of a worksheet with `grid`, starting at the
    /// top-left cell. Cells outside the new grid are cleared.
    async fn write_values(&self, id: &ContainerId, worksheet: &str, grid: &[Vec<String>])
    -> Result<()>;
}
