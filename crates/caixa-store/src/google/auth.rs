//! Service-account OAuth2 for the Google APIs.
//!
//! Exchanges a signed JWT assertion for a bearer token at the key's
//! `token_uri` and caches the token until shortly before it expires.

use std::path::Path;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scopes needed to create, move and edit spreadsheets.
pub const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Tokens are refreshed this long before Google says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service-account JSON key file that are used.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email, the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// OAuth2 token endpoint.
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Reads a key file downloaded from the Google Cloud console.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Auth(format!(
                "cannot read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Parses the JSON contents of a key file.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Auth(format!("invalid service account key: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Hands out bearer tokens, fetching a new one when the cached one expires.
pub struct TokenSource {
    cached: RwLock<Option<CachedToken>>,
    key: Option<ServiceAccountKey>,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSource")
            .field("client_email", &self.key.as_ref().map(|k| &k.client_email))
            .finish_non_exhaustive()
    }
}

impl TokenSource {
    /// Creates a token source for a service account.
    pub fn new(key: ServiceAccountKey, http_client: reqwest::Client) -> Self {
        Self {
            cached: RwLock::new(None),
            key: Some(key),
            http_client,
        }
    }

    /// Creates a token source that always returns `token` (for testing).
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            cached: RwLock::new(Some(CachedToken {
                token: token.into(),
                expires_at: Instant::now() + Duration::from_secs(365 * 24 * 3600),
            })),
            key: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Returns a valid bearer token.
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = self.lookup_cached() {
            return Ok(token);
        }

        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::Auth("static token expired".to_string()))?;
        let fetched = self.fetch(key).await?;
        let token = fetched.token.clone();

        let mut cache = self
            .cached
            .write()
            .map_err(|e| Error::Auth(e.to_string()))?;
        *cache = Some(fetched);
        Ok(token)
    }

    fn lookup_cached(&self) -> Option<String> {
        let cache = self.cached.read().ok()?;
        let cached = cache.as_ref()?;
        if Instant::now() + EXPIRY_MARGIN >= cached.expires_at {
            return None;
        }
        Some(cached.token.clone())
    }

    async fn fetch(&self, key: &ServiceAccountKey) -> Result<CachedToken> {
        let assertion = sign_assertion(key, chrono::Utc::now().timestamp())?;
        tracing::debug!(client_email = %key.client_email, "requesting access token");

        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint rejected assertion (HTTP {status}): {body}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("token response parse failed: {e}")))?;

        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }
}

/// Signs the RS256 assertion exchanged for an access token.
fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SCOPES,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_TTL_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| Error::Auth(format!("invalid private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| Error::Auth(format!("cannot sign assertion: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const KEY_JSON: &str = r#"{
        "type": "service_account",
        "project_id": "caixa-test",
        "client_email": "caixa@caixa-test.iam.gserviceaccount.com",
        "private_key": "not a pem",
        "token_uri": "https://oauth2.googleapis.com/token"
    }"#;

    #[test]
    fn test_key_from_json_ignores_extra_fields() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        assert_eq!(key.client_email, "caixa@caixa-test.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_key_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(KEY_JSON.as_bytes()).unwrap();
        let key = ServiceAccountKey::from_file(file.path()).unwrap();
        assert_eq!(key.private_key, "not a pem");
    }

    #[test]
    fn test_missing_key_file_is_auth_error() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_invalid_pem_is_auth_error() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let err = sign_assertion(&key, 0).unwrap_err();
        assert!(err.to_string().contains("invalid private key"));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = TokenSource::with_static_token("ya29.test");
        assert_eq!(source.token().await.unwrap(), "ya29.test");
        assert_eq!(source.token().await.unwrap(), "ya29.test");
    }
}
