//! Firebase Auth adapter for credential validation.
//!
//! Implements the `SessionValidator` port for the two credential kinds
//! Firebase issues:
//!
//! 1. ID tokens, signed with keys published as a JWK set
//! 2. Session cookies, signed with keys published as X.509 certificates
//!
//! Both are RS256 JWTs. Validation checks signature, issuer, audience
//! (the Firebase project id) and expiry, then maps `sub` to the user id.
//!
//! # Example
//!
//! ```ignore
//! use creator_vault::adapters::auth::{FirebaseConfig, FirebaseSessionValidator};
//!
//! let validator = FirebaseSessionValidator::new(FirebaseConfig::new("creator-vault-prod"));
//! let user = validator.verify_id_token("eyJ...").await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::foundation::{AuthError, AuthenticatedUser, CredentialKind, UserId};
use crate::ports::SessionValidator;

/// Google endpoint serving ID token signing keys as JWKs.
pub const ID_TOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Google endpoint serving session cookie signing keys as PEM certificates.
pub const SESSION_COOKIE_CERTS_URL: &str =
    "https://www.googleapis.com/identitytoolkit/v3/relyingparty/publicKeys";

/// Configuration for the Firebase adapter.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Firebase project id. Used as the audience and in both issuers.
    pub project_id: String,

    /// How long fetched keys are reused before refetching.
    /// Defaults to 1 hour if not specified.
    pub key_cache_duration: Option<Duration>,

    pub id_token_keys_url: String,
    pub session_cookie_keys_url: String,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            key_cache_duration: None,
            id_token_keys_url: ID_TOKEN_JWKS_URL.to_string(),
            session_cookie_keys_url: SESSION_COOKIE_CERTS_URL.to_string(),
        }
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.key_cache_duration = Some(duration);
        self
    }

    /// Overrides the key endpoints (emulators, tests).
    pub fn with_key_urls(
        mut self,
        id_token_keys_url: impl Into<String>,
        session_cookie_keys_url: impl Into<String>,
    ) -> Self {
        self.id_token_keys_url = id_token_keys_url.into();
        self.session_cookie_keys_url = session_cookie_keys_url.into();
        self
    }

    /// Expected `iss` claim for a credential kind.
    fn issuer(&self, kind: CredentialKind) -> String {
        match kind {
            CredentialKind::IdToken => {
                format!("https://securetoken.google.com/{}", self.project_id)
            }
            CredentialKind::SessionCookie => {
                format!("https://session.firebase.google.com/{}", self.project_id)
            }
        }
    }

    fn keys_url(&self, kind: CredentialKind) -> &str {
        match kind {
            CredentialKind::IdToken => &self.id_token_keys_url,
            CredentialKind::SessionCookie => &self.session_cookie_keys_url,
        }
    }
}

/// JWT claims carried by Firebase credentials.
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,

    iss: String,

    aud: String,

    #[allow(dead_code)]
    exp: i64,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    email_verified: Option<bool>,
}

/// Signing keys by `kid`, with expiry tracking.
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    cache_duration: Duration,
}

impl KeyCache {
    fn new(keys: HashMap<String, DecodingKey>, cache_duration: Duration) -> Self {
        Self {
            keys,
            fetched_at: Instant::now(),
            cache_duration,
        }
    }

    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.cache_duration
    }
}

/// Firebase session validator.
///
/// Keys are fetched lazily on first use and cached per credential kind.
pub struct FirebaseSessionValidator {
    config: FirebaseConfig,
    http_client: reqwest::Client,
    id_token_keys: Arc<RwLock<Option<KeyCache>>>,
    session_cookie_keys: Arc<RwLock<Option<KeyCache>>>,
}

impl FirebaseSessionValidator {
    pub fn new(config: FirebaseConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            http_client,
            id_token_keys: Arc::new(RwLock::new(None)),
            session_cookie_keys: Arc::new(RwLock::new(None)),
        }
    }

    fn cache_for(&self, kind: CredentialKind) -> &Arc<RwLock<Option<KeyCache>>> {
        match kind {
            CredentialKind::IdToken => &self.id_token_keys,
            CredentialKind::SessionCookie => &self.session_cookie_keys,
        }
    }

    async fn fetch_keys(&self, kind: CredentialKind) -> Result<HashMap<String, DecodingKey>, AuthError> {
        let url = self.config.keys_url(kind);
        tracing::debug!(url, "Fetching Firebase signing keys");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch signing keys");
            AuthError::service_unavailable(format!("Failed to fetch signing keys: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "Signing key endpoint returned an error");
            return Err(AuthError::service_unavailable(format!(
                "Signing key endpoint returned {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            AuthError::service_unavailable(format!("Failed to read signing keys: {}", e))
        })?;

        let keys = match kind {
            CredentialKind::IdToken => parse_jwks(&body)?,
            CredentialKind::SessionCookie => parse_certificates(&body)?,
        };
        tracing::debug!(count = keys.len(), "Fetched Firebase signing keys");
        Ok(keys)
    }

    /// Looks up the key for `kid`, refetching once when the cache is stale
    /// or doesn't know the key (Google rotates keys daily).
    async fn decoding_key(&self, kind: CredentialKind, kid: &str) -> Result<DecodingKey, AuthError> {
        let cache = self.cache_for(kind);
        {
            let cached = cache.read().await;
            if let Some(ref cached) = *cached {
                if !cached.is_expired() {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        let keys = self.fetch_keys(kind).await?;
        let key = keys.get(kid).cloned();
        {
            let mut cached = cache.write().await;
            let duration = self
                .config
                .key_cache_duration
                .unwrap_or(Duration::from_secs(3600));
            *cached = Some(KeyCache::new(keys, duration));
        }

        key.ok_or_else(|| {
            tracing::warn!(kid, "No matching signing key");
            AuthError::InvalidToken
        })
    }

    async fn verify_credential(
        &self,
        credential: &str,
        kind: CredentialKind,
    ) -> Result<AuthenticatedUser, AuthError> {
        let header = decode_header(credential).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode JWT header");
            AuthError::InvalidToken
        })?;

        if header.alg != Algorithm::RS256 {
            tracing::warn!(alg = ?header.alg, "Unexpected JWT algorithm");
            return Err(AuthError::InvalidToken);
        }

        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("JWT missing 'kid' header");
            AuthError::InvalidToken
        })?;

        let key = self.decoding_key(kind, &kid).await?;
        let issuer = self.config.issuer(kind);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&issuer]);
        validation.set_audience(&[&self.config.project_id]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<FirebaseClaims>(credential, &key, &validation)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Credential expired");
                        AuthError::TokenExpired
                    }
                    _ => {
                        tracing::warn!(error = %e, "Credential validation failed");
                        AuthError::InvalidToken
                    }
                }
            })?
            .claims;

        if claims.iss != issuer || claims.aud != self.config.project_id {
            return Err(AuthError::InvalidToken);
        }

        let user_id = UserId::new(claims.sub).map_err(|_| {
            tracing::warn!("Credential has an empty subject");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(
            user_id,
            claims.email,
            claims.email_verified.unwrap_or(false),
        ))
    }
}

fn parse_jwks(body: &str) -> Result<HashMap<String, DecodingKey>, AuthError> {
    let jwks: JwkSet = serde_json::from_str(body)
        .map_err(|e| AuthError::service_unavailable(format!("Failed to parse JWKS: {}", e)))?;

    let mut keys = HashMap::new();
    for jwk in &jwks.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            continue;
        };
        match DecodingKey::from_jwk(jwk) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(e) => tracing::warn!(kid, error = %e, "Skipping unusable JWK"),
        }
    }
    Ok(keys)
}

/// Parses the `{kid: pem_certificate}` map Google serves for session cookies.
fn parse_certificates(body: &str) -> Result<HashMap<String, DecodingKey>, AuthError> {
    let certs: HashMap<String, String> = serde_json::from_str(body).map_err(|e| {
        AuthError::service_unavailable(format!("Failed to parse certificates: {}", e))
    })?;

    let mut keys = HashMap::new();
    for (kid, pem) in certs {
        match DecodingKey::from_rsa_pem(pem.as_bytes()) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(e) => tracing::warn!(kid, error = %e, "Skipping unusable certificate"),
        }
    }
    Ok(keys)
}

#[async_trait]
impl SessionValidator for FirebaseSessionValidator {
    async fn verify_id_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify_credential(token, CredentialKind::IdToken).await
    }

    async fn verify_session_cookie(&self, cookie: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify_credential(cookie, CredentialKind::SessionCookie)
            .await
    }
}

impl std::fmt::Debug for FirebaseSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseSessionValidator")
            .field("project_id", &self.config.project_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn issuers_depend_on_credential_kind() {
        let config = FirebaseConfig::new("vault-dev");
        assert_eq!(
            config.issuer(CredentialKind::IdToken),
            "https://securetoken.google.com/vault-dev"
        );
        assert_eq!(
            config.issuer(CredentialKind::SessionCookie),
            "https://session.firebase.google.com/vault-dev"
        );
    }

    #[test]
    fn default_key_urls_point_at_google() {
        let config = FirebaseConfig::new("vault-dev");
        assert_eq!(config.keys_url(CredentialKind::IdToken), ID_TOKEN_JWKS_URL);
        assert_eq!(
            config.keys_url(CredentialKind::SessionCookie),
            SESSION_COOKIE_CERTS_URL
        );
    }

    #[test]
    fn config_with_custom_cache_duration() {
        let config = FirebaseConfig::new("vault-dev").with_cache_duration(Duration::from_secs(300));
        assert_eq!(config.key_cache_duration, Some(Duration::from_secs(300)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Key Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn empty_jwks_parses_to_no_keys() {
        let keys = parse_jwks(r#"{"keys": []}"#).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn malformed_jwks_is_service_unavailable() {
        let err = parse_jwks("not json").err().unwrap();
        assert!(err.is_transient());
    }

    #[test]
    fn unusable_certificates_are_skipped() {
        let keys = parse_certificates(r#"{"kid1": "not a pem"}"#).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn key_cache_expires_after_duration() {
        let cache = KeyCache::new(HashMap::new(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.is_expired());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn garbage_token_is_rejected_before_key_fetch() {
        let validator = FirebaseSessionValidator::new(
            FirebaseConfig::new("vault-dev").with_key_urls("http://127.0.0.1:1", "http://127.0.0.1:1"),
        );
        let err = validator.verify_id_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn firebase_validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FirebaseSessionValidator>();
    }
}
