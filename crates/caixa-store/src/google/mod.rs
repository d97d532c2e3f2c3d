//! Google Drive v3 + Sheets v4 backend.
//!
//! Spreadsheets are found and moved through Drive; worksheets and cell
//! values go through Sheets. All requests carry a bearer token from a
//! service-account [`TokenSource`].

pub mod auth;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use caixa_core::{ContainerId, FolderId, WorksheetId};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};

pub use auth::{ServiceAccountKey, TokenSource};

use crate::backend::{Container, StoreBackend, WorksheetRef};
use crate::{Error, Result};

/// Drive MIME type of a Google Sheets file.
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Default Drive API root.
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Default Sheets API root.
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Longest response body kept in a [`Error::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Settings for [`GoogleBackend`].
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Service-account JSON key file.
    pub credentials_path: PathBuf,
    /// Drive API root.
    pub drive_base_url: String,
    /// Sheets API root.
    pub sheets_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("service_account.json"),
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`StoreBackend`] over the Google Drive and Sheets REST APIs.
#[derive(Debug)]
pub struct GoogleBackend {
    http: reqwest::Client,
    tokens: TokenSource,
    drive: Url,
    sheets: Url,
}

impl GoogleBackend {
    /// Loads the service-account key and builds the HTTP client.
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let tokens = TokenSource::new(key, http.clone());
        Self::with_token_source(config, http, tokens)
    }

    /// Builds a backend around an existing token source.
    pub fn with_token_source(
        config: &GoogleConfig,
        http: reqwest::Client,
        tokens: TokenSource,
    ) -> Result<Self> {
        Ok(Self {
            http,
            tokens,
            drive: parse_base(&config.drive_base_url)?,
            sheets: parse_base(&config.sheets_base_url)?,
        })
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.tokens.token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = check(operation, request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn batch_update(&self, id: &ContainerId, requests: Value) -> Result<BatchUpdateResponse> {
        let url = endpoint(&self.sheets, &["spreadsheets", &format!("{id}:batchUpdate")])?;
        let request = self
            .request(Method::POST, url)
            .await?
            .json(&json!({ "requests": requests }));
        self.send_json("batch_update", request).await
    }

    fn values_url(&self, id: &ContainerId, range: &str) -> Result<Url> {
        endpoint(&self.sheets, &["spreadsheets", id.as_str(), "values", range])
    }
}

#[async_trait]
impl StoreBackend for GoogleBackend {
    fn name(&self) -> &str {
        "google"
    }

    async fn find_containers(&self, folder: &FolderId, name: &str) -> Result<Vec<ContainerId>> {
        let url = endpoint(&self.drive, &["files"])?;
        let query = drive_query(folder, name);
        let request = self.request(Method::GET, url).await?.query(&[
            ("q", query.as_str()),
            ("spaces", "drive"),
            ("fields", "files(id,name)"),
        ]);
        let listed: FileList = self.send_json("find_containers", request).await?;

        // Only exact title matches count.
        Ok(listed
            .files
            .into_iter()
            .filter(|file| file.name == name)
            .map(|file| ContainerId::new(file.id))
            .collect())
    }

    async fn create_container(&self, name: &str) -> Result<Container> {
        let url = endpoint(&self.sheets, &["spreadsheets"])?;
        let request = self
            .request(Method::POST, url)
            .await?
            .json(&json!({ "properties": { "title": name } }));
        let spreadsheet: Spreadsheet = self.send_json("create_container", request).await?;
        tracing::debug!(container_id = %spreadsheet.spreadsheet_id, "spreadsheet created");
        Ok(spreadsheet.into_container())
    }

    async fn move_to_folder(&self, id: &ContainerId, folder: &FolderId) -> Result<()> {
        let url = endpoint(&self.drive, &["files", id.as_str()])?;
        let request = self
            .request(Method::GET, url.clone())
            .await?
            .query(&[("fields", "parents")]);
        let current: FileParents = self.send_json("move_to_folder", request).await?;
        let remove = current.parents.join(",");

        let request = self
            .request(Method::PATCH, url)
            .await?
            .query(&[
                ("addParents", folder.as_str()),
                ("removeParents", remove.as_str()),
                ("fields", "id,parents"),
            ])
            .json(&json!({}));
        let _: Value = self.send_json("move_to_folder", request).await?;
        Ok(())
    }

    async fn open_container(&self, id: &ContainerId) -> Result<Container> {
        let url = endpoint(&self.sheets, &["spreadsheets", id.as_str()])?;
        let request = self.request(Method::GET, url).await?.query(&[(
            "fields",
            "spreadsheetId,properties.title,sheets.properties(sheetId,title)",
        )]);
        let spreadsheet: Spreadsheet = self.send_json("open_container", request).await?;
        Ok(spreadsheet.into_container())
    }

    async fn add_worksheet(&self, id: &ContainerId, title: &str) -> Result<WorksheetRef> {
        let response = self
            .batch_update(id, json!([{ "addSheet": { "properties": { "title": title } } }]))
            .await?;
        response
            .replies
            .into_iter()
            .find_map(|reply| reply.add_sheet)
            .map(|added| added.properties.into_worksheet())
            .ok_or_else(|| Error::backend("add_worksheet", "response has no addSheet reply"))
    }

    async fn remove_worksheet(&self, id: &ContainerId, worksheet: WorksheetId) -> Result<()> {
        self.batch_update(id, json!([{ "deleteSheet": { "sheetId": worksheet.0 } }]))
            .await?;
        Ok(())
    }

    async fn read_values(&self, id: &ContainerId, worksheet: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(id, &quote_sheet_title(worksheet))?;
        let request = self.request(Method::GET, url).await?;
        let range: ValueRange = self.send_json("read_values", request).await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn write_values(
        &self,
        id: &ContainerId,
        worksheet: &str,
        grid: &[Vec<String>],
    ) -> Result<()> {
        let title = quote_sheet_title(worksheet);

        let clear_url = self.values_url(id, &format!("{title}:clear"))?;
        let request = self.request(Method::POST, clear_url).await?.json(&json!({}));
        let _: Value = self.send_json("write_values", request).await?;

        if grid.is_empty() {
            return Ok(());
        }

        let range = format!("{title}!A1");
        let url = self.values_url(id, &range)?;
        let request = self
            .request(Method::PUT, url)
            .await?
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": grid,
            }));
        let _: Value = self.send_json("write_values", request).await?;
        Ok(())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct FileParents {
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl SheetProperties {
    fn into_worksheet(self) -> WorksheetRef {
        WorksheetRef {
            id: WorksheetId(self.sheet_id),
            title: self.title,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

impl Spreadsheet {
    fn into_container(self) -> Container {
        Container {
            id: ContainerId::new(self.spreadsheet_id),
            name: self.properties.title,
            worksheets: self
                .sheets
                .into_iter()
                .map(|sheet| sheet.properties.into_worksheet())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchReply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchReply>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Drive search expression for a client's spreadsheet.
pub fn drive_query(folder: &FolderId, name: &str) -> String {
    format!(
        "'{}' in parents and name = '{}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false",
        escape_query_literal(folder.as_str()),
        escape_query_literal(name),
    )
}

fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Quotes a worksheet title for use in A1 notation.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::config(format!("invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::config(format!("'{raw}' cannot be used as a base URL")));
    }
    Ok(url)
}

/// Appends percent-encoded path segments to an API root.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("'{base}' cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

async fn check(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    tracing::warn!(operation, status = status.as_u16(), "google api request failed");
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::NotFound(body));
    }
    Err(Error::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}
