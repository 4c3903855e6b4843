//! Vault HTTP client for KV v2 reads with static-token auth.

use crate::{
    config::VaultConfig,
    error::{VaultError, VaultResult},
    provider::{KvReader, KvSecret, KvSecretRequest},
    secrets::{ErrorResponse, KvV2Response, TokenInfo, TokenLookupResponse},
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use rust_common::{HttpConfig, build_http_client};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};
use url::Url;

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
const LOOKUP_SELF: [&str; 3] = ["auth", "token", "lookup-self"];

/// Vault client session.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug)]
pub struct VaultClient {
    config: VaultConfig,
    base: Url,
    http: Client,
}

/// Status and raw body of a completed request.
struct Reply {
    status: StatusCode,
    body: String,
}

impl Reply {
    /// Body of a 2xx reply, otherwise the error the status maps to.
    fn into_success(self, path: &str) -> VaultResult<String> {
        if self.status.is_success() {
            return Ok(self.body);
        }

        let message = error_message(&self.body);
        warn!(path, status = self.status.as_u16(), %message, "Vault request failed");

        match self.status.as_u16() {
            404 => Err(VaultError::not_found(path)),
            401 | 403 => Err(VaultError::PermissionDenied(format!("{path}: {message}"))),
            429 => Err(VaultError::RateLimited),
            _ => Err(VaultError::unavailable(format!("Status {}: {message}", self.status))),
        }
    }
}

impl VaultClient {
    /// Create a new Vault client.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] for an unusable configuration and
    /// [`VaultError::Platform`] if the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        config.validate()?;

        let base = Url::parse(config.base_url())
            .map_err(|e| VaultError::InvalidConfig(format!("address {}: {e}", config.address)))?;
        if base.cannot_be_a_base() {
            return Err(VaultError::InvalidConfig(format!(
                "address {} cannot carry a path",
                config.address
            )));
        }

        let http = build_http_client(&HttpConfig::default().with_timeout(config.timeout))?;

        Ok(Self { config, base, http })
    }

    /// Configuration the client was built with.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Read a secret from a KV v2 engine.
    ///
    /// A version that was deleted or destroyed comes back with empty data and
    /// its metadata rather than as an error.
    ///
    /// # Errors
    ///
    /// [`VaultError::SecretNotFound`] when Vault answers 404 for a secret that
    /// never existed, otherwise the status mapping of the underlying request.
    #[instrument(skip(self), fields(path = %request.path(), version = ?request.version))]
    pub async fn kv_v2_read(&self, request: &KvSecretRequest) -> VaultResult<KvSecret> {
        let path = request.path();
        debug!("Reading KV v2 secret");

        let segments = request
            .mount
            .trim_matches('/')
            .split('/')
            .chain(["data"])
            .chain(request.name.trim_matches('/').split('/'));

        let mut builder = self.request(Method::GET, segments, request.namespace.as_deref());
        if let Some(version) = request.version {
            builder = builder.query(&[("version", version)]);
        }

        let reply = self.send(builder).await?;

        if reply.status == StatusCode::NOT_FOUND {
            if let Some(secret) = removed_version(&path, &reply.body) {
                info!(
                    version = secret.metadata.version,
                    destroyed = secret.metadata.destroyed,
                    "Secret version is deleted"
                );
                return Ok(secret);
            }
        }

        let body: KvV2Response = serde_json::from_str(&reply.into_success(&path)?)?;

        for warning in body.warnings.iter().flatten() {
            warn!(%path, warning = %warning, "Vault returned a warning");
        }

        Ok(KvSecret::from_response(path, body.data))
    }

    /// Look up the properties of the configured token.
    ///
    /// Used to prove the token is accepted before any secret is read.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AuthenticationFailed`] when Vault rejects the token.
    #[instrument(skip(self))]
    pub async fn lookup_self(&self) -> VaultResult<TokenInfo> {
        let path = LOOKUP_SELF.join("/");

        let reply = self.send(self.request(Method::GET, LOOKUP_SELF, None)).await?;
        let body = match reply.into_success(&path) {
            Ok(body) => body,
            Err(VaultError::PermissionDenied(msg)) => return Err(VaultError::auth_failed(msg)),
            Err(e) => return Err(e),
        };

        let body: TokenLookupResponse = serde_json::from_str(&body)?;
        debug!(
            accessor = %body.data.accessor,
            display_name = %body.data.display_name,
            ttl_secs = body.data.ttl,
            "Token accepted by Vault"
        );
        Ok(body.data)
    }

    /// `{address}/v1/{segments}`, each segment percent-encoded on its own.
    fn url<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    fn request<'s>(
        &self,
        method: Method,
        segments: impl IntoIterator<Item = &'s str>,
        namespace: Option<&str>,
    ) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, self.url(segments))
            .header(TOKEN_HEADER, self.config.token.expose_secret());

        if let Some(ns) = namespace.or(self.config.namespace.as_deref()) {
            request = request.header(NAMESPACE_HEADER, ns);
        }

        request
    }

    async fn send(&self, request: RequestBuilder) -> VaultResult<Reply> {
        let response = request
            .send()
            .await
            .map_err(|e| VaultError::unavailable(format!("{}: {e}", self.config.base_url())))?;

        let status = response.status();
        let body = response.text().await?;
        Ok(Reply { status, body })
    }
}

#[async_trait]
impl KvReader for VaultClient {
    async fn read_kv_secret(&self, request: &KvSecretRequest) -> VaultResult<KvSecret> {
        self.kv_v2_read(request).await
    }
}

/// Vault answers 404 for deleted or destroyed versions but still sends their metadata.
fn removed_version(path: &str, body: &str) -> Option<KvSecret> {
    let body: KvV2Response = serde_json::from_str(body).ok()?;
    let metadata = &body.data.metadata;
    (metadata.deletion_time.is_some() || metadata.destroyed)
        .then(|| KvSecret::from_response(path.to_string(), body.data))
}

/// Join Vault's `errors` array, falling back to the raw body.
fn error_message(body: &str) -> String {
    let errors = serde_json::from_str::<ErrorResponse>(body)
        .map(|body| body.errors)
        .unwrap_or_default();

    if !errors.is_empty() {
        errors.join("; ")
    } else if body.trim().is_empty() {
        "no error detail".to_string()
    } else {
        body.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = VaultClient::new(VaultConfig::new("not a url", "root")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));

        let err = VaultClient::new(VaultConfig::new("http://127.0.0.1:8200", " ")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));
    }

    #[test]
    fn test_new_keeps_config() {
        let client = VaultClient::new(
            VaultConfig::new("http://127.0.0.1:8200/", "root").with_namespace("team-a"),
        )
        .unwrap();
        assert_eq!(client.config().base_url(), "http://127.0.0.1:8200");
        assert_eq!(client.config().namespace.as_deref(), Some("team-a"));
    }

    #[test]
    fn test_url_escapes_each_segment() {
        let client = VaultClient::new(VaultConfig::new("http://127.0.0.1:8200/", "root")).unwrap();

        let url = client.url(["kvv2", "data", "a?b#c d%e"]);
        assert_eq!(url.as_str(), "http://127.0.0.1:8200/v1/kvv2/data/a%3Fb%23c%20d%25e");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_url_keeps_address_path_prefix() {
        let client =
            VaultClient::new(VaultConfig::new("https://proxy.example.com/vault", "root")).unwrap();

        let url = client.url(LOOKUP_SELF);
        assert_eq!(url.as_str(), "https://proxy.example.com/vault/v1/auth/token/lookup-self");
    }

    #[test]
    fn test_removed_version_needs_deletion_marker() {
        let deleted = r#"{"data":{"data":null,"metadata":{"created_time":"2024-01-01T00:00:00Z","deletion_time":"2024-02-01T00:00:00Z","destroyed":false,"version":2}}}"#;
        let secret = removed_version("kvv2/data/gone", deleted).unwrap();
        assert!(secret.data.is_empty());
        assert_eq!(secret.metadata.version, 2);

        assert!(removed_version("kvv2/data/gone", r#"{"errors":[]}"#).is_none());

        let live = r#"{"data":{"data":null,"metadata":{"created_time":"2024-01-01T00:00:00Z","deletion_time":"","destroyed":false,"version":2}}}"#;
        assert!(removed_version("kvv2/data/gone", live).is_none());
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"errors":["a","b"]}"#), "a; b");
        assert_eq!(error_message("  "), "no error detail");
        assert_eq!(error_message("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let client = VaultClient::new(VaultConfig::new("http://127.0.0.1:8200", "s.leaky")).unwrap();
        assert!(!format!("{client:?}").contains("s.leaky"));
    }
}
