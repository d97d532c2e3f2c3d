//! Identifier types for clients, spreadsheets and worksheets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// The free-text name a client signs in with.
///
/// Doubles as the spreadsheet title and the lookup key. Two names are equal
/// only when their bytes are identical: no trimming, case folding or Unicode
/// normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientName(String);

impl ClientName {
    /// Creates a client name, rejecting the empty string.
    ///
    /// # Examples
    ///
    /// ```
    /// use caixa_core::ClientName;
    ///
    /// let name = ClientName::new("Acme").unwrap();
    /// assert_eq!(name.as_str(), "Acme");
    /// assert!(ClientName::new("").is_err());
    /// ```
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::validation_field(
                "cliente",
                "client name must not be empty",
            ));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ClientName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<ClientName> for String {
    fn from(name: ClientName) -> Self {
        name.0
    }
}

impl std::str::FromStr for ClientName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ClientName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Backend identifier of a spreadsheet (Drive file id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Wraps a backend file id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend identifier of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(String);

impl FolderId {
    /// Wraps a backend folder id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric identifier of a worksheet inside a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorksheetId(pub i64);

impl fmt::Display for WorksheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_name_rejects_empty() {
        let err = ClientName::new("").unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_client_name_is_not_normalized() {
        let padded = ClientName::new(" Acme").unwrap();
        let plain = ClientName::new("Acme").unwrap();
        let upper = ClientName::new("ACME").unwrap();
        assert_ne!(padded, plain);
        assert_ne!(upper, plain);
        assert_eq!(padded.as_str(), " Acme");
    }

    #[test]
    fn test_client_name_serde_rejects_empty() {
        let result: std::result::Result<ClientName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let name: ClientName = serde_json::from_str("\"Padaria São João\"").unwrap();
        assert_eq!(name.as_str(), "Padaria São João");
    }

    #[test]
    fn test_container_id_display() {
        let id = ContainerId::new("1AbC");
        assert_eq!(id.to_string(), "1AbC");
        assert_eq!(id.as_str(), "1AbC");
    }

    #[test]
    fn test_worksheet_id_display() {
        assert_eq!(WorksheetId(42).to_string(), "42");
    }
}
