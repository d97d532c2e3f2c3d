//! Configuration file and environment overrides.
//!
//! The file lives at `<config dir>/caixa/config.toml` unless a path is given.
//! A missing default file means "all defaults"; a missing explicit file is an
//! error. `CAIXA_*` environment variables override file values.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use caixa_core::FolderId;
use caixa_store::google::{DEFAULT_DRIVE_BASE_URL, DEFAULT_SHEETS_BASE_URL};
use caixa_store::{GoogleBackend, GoogleConfig, MemoryBackend, Resolver, StoreBackend};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Project name used for the config directory.
pub const PROJECT_NAME: &str = "caixa";

/// Environment variables read by [`CaixaConfig::apply_env_overrides`].
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CAIXA_BIND", "server.bind"),
    ("CAIXA_BACKEND", "store.backend"),
    ("CAIXA_PARENT_FOLDER_ID", "store.parent_folder_id"),
    ("CAIXA_CREDENTIALS_PATH", "google.credentials_path"),
    ("CAIXA_LOG", "logging.filter"),
];

/// Which store backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Google Drive + Sheets
    #[default]
    Google,
    /// In-process store, lost on exit
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(BackendKind::Google),
            "memory" => Ok(BackendKind::Memory),
            other => Err(Error::config(format!(
                "unknown backend '{other}' (expected 'google' or 'memory')"
            ))),
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: BackendKind,
    /// Folder holding every client spreadsheet
    pub parent_folder_id: String,
}

/// `[google]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSection {
    /// Service-account JSON key file
    pub credentials_path: PathBuf,
    /// Drive API root
    pub drive_base_url: String,
    /// Sheets API root
    pub sheets_base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GoogleSection {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("service_account.json"),
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,caixa=debug".to_string(),
        }
    }
}

/// Complete Caixa configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaixaConfig {
    /// HTTP server
    pub server: ServerConfig,
    /// Store selection
    pub store: StoreConfig,
    /// Google backend
    pub google: GoogleSection,
    /// Log filter
    pub logging: LoggingConfig,
}

impl CaixaConfig {
    /// `<config dir>/caixa/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// The explicit path if given, otherwise [`default_path`](Self::default_path).
    pub fn resolve_path(explicit: Option<&str>) -> Option<PathBuf> {
        explicit.map(PathBuf::from).or_else(Self::default_path)
    }

    /// Loads the file, then applies environment overrides.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(Path::new(path))?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parses one TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parses TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Applies `CAIXA_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("CAIXA_BIND") {
            self.server.bind = bind;
        }
        if let Some(backend) = lookup("CAIXA_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(folder) = lookup("CAIXA_PARENT_FOLDER_ID") {
            self.store.parent_folder_id = folder;
        }
        if let Some(path) = lookup("CAIXA_CREDENTIALS_PATH") {
            self.google.credentials_path = PathBuf::from(path);
        }
        if let Some(filter) = lookup("CAIXA_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Checks what serving needs.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.store.backend == BackendKind::Google {
            if self.store.parent_folder_id.trim().is_empty() {
                return Err(Error::config(
                    "store.parent_folder_id must be set for the google backend",
                ));
            }
            if self.google.timeout_secs == 0 {
                return Err(Error::config("google.timeout_secs must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Parsed `server.bind`.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| Error::config(format!("invalid server.bind '{}': {e}", self.server.bind)))
    }

    /// Settings for the Google backend.
    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig {
            credentials_path: self.google.credentials_path.clone(),
            drive_base_url: self.google.drive_base_url.clone(),
            sheets_base_url: self.google.sheets_base_url.clone(),
            timeout: Duration::from_secs(self.google.timeout_secs),
        }
    }

    /// Parent folder; `clientes` when unset, which only suits the memory
    /// backend.
    pub fn parent_folder(&self) -> FolderId {
        let id = self.store.parent_folder_id.trim();
        if id.is_empty() {
            FolderId::new("clientes")
        } else {
            FolderId::new(id)
        }
    }

    /// Builds the configured backend.
    pub fn build_backend(&self) -> Result<Arc<dyn StoreBackend>> {
        Ok(match self.store.backend {
            BackendKind::Google => Arc::new(GoogleBackend::new(&self.google_config())?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        })
    }

    /// Builds a resolver over the configured backend.
    pub fn build_resolver(&self) -> Result<Resolver> {
        Ok(Resolver::new(self.build_backend()?, self.parent_folder()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CaixaConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.store.backend, BackendKind::Google);
        assert_eq!(config.google.timeout_secs, 30);
        assert_eq!(config.logging.filter, "info,caixa=debug");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = CaixaConfig::from_toml_str(
            r#"
            [store]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.google.sheets_base_url, DEFAULT_SHEETS_BASE_URL);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = CaixaConfig::default();
        config.store.parent_folder_id = "1XyZ".to_string();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[store]"));
        assert_eq!(CaixaConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"0.0.0.0:9000\"").unwrap();
        let config = CaixaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");

        let err = CaixaConfig::from_file(Path::new("/nonexistent/caixa.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CAIXA_BACKEND", "Memory"),
            ("CAIXA_PARENT_FOLDER_ID", "pasta"),
            ("CAIXA_LOG", "warn"),
        ]
        .into_iter()
        .collect();
        let mut config = CaixaConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.store.parent_folder_id, "pasta");
        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.server.bind, "127.0.0.1:8501");
    }

    #[test]
    fn test_bad_backend_override() {
        let mut config = CaixaConfig::default();
        let err = config
            .apply_overrides(|key| (key == "CAIXA_BACKEND").then(|| "sqlite".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("unknown backend 'sqlite'"));
    }

    #[test]
    fn test_validate() {
        let mut config = CaixaConfig::default();
        assert!(config.validate().is_err());

        config.store.parent_folder_id = "pasta".to_string();
        config.validate().unwrap();

        config.server.bind = "localhost".to_string();
        assert!(config.validate().is_err());

        let mut memory = CaixaConfig::default();
        memory.store.backend = BackendKind::Memory;
        memory.validate().unwrap();
        assert_eq!(memory.parent_folder(), FolderId::new("clientes"));
    }
}
