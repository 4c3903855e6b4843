//! KV v2 read abstraction.
//!
//! Consumers hold an `Arc<dyn KvReader>` so they can be exercised without a
//! Vault server.

use crate::error::VaultResult;
use crate::secrets::KvV2Data;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Compose the KV v2 data path for a secret.
///
/// Slashes around `mount` and `name` are dropped so `"kvv2/"` and `"kvv2"`
/// address the same secret.
#[must_use]
pub fn kv_v2_data_path(mount: &str, name: &str) -> String {
    format!("{}/data/{}", mount.trim_matches('/'), name.trim_matches('/'))
}

/// Which secret to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSecretRequest {
    /// Mount point of the KV v2 engine
    pub mount: String,
    /// Secret name below the mount, may contain `/`
    pub name: String,
    /// Namespace overriding the client default
    pub namespace: Option<String>,
    /// Specific version to read, latest when `None`
    pub version: Option<u64>,
}

impl KvSecretRequest {
    /// Request the latest version of `name` under `mount`.
    #[must_use]
    pub fn new(mount: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            name: name.into(),
            namespace: None,
            version: None,
        }
    }

    /// Read inside `namespace` instead of the client default.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Pin the read to `version`.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Storage path of the secret, `{mount}/data/{name}`.
    #[must_use]
    pub fn path(&self) -> String {
        kv_v2_data_path(&self.mount, &self.name)
    }
}

/// Version metadata of a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvVersionMetadata {
    /// Version number, starting at 1
    pub version: u64,
    /// When this version was written
    pub created_time: DateTime<Utc>,
    /// Soft-deletion time, `None` while the version is live
    pub deletion_time: Option<DateTime<Utc>>,
    /// Whether the version data was permanently removed
    pub destroyed: bool,
    /// Metadata attached to the secret as a whole
    pub custom_metadata: BTreeMap<String, String>,
}

/// A secret read from a KV v2 engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSecret {
    /// `{mount}/data/{name}`
    pub path: String,
    /// Key/value pairs; non-string values hold their compact JSON text
    pub data: BTreeMap<String, String>,
    /// Metadata of the version that was read
    pub metadata: KvVersionMetadata,
}

impl KvSecret {
    /// Build a secret from the wire payload returned for `path`.
    ///
    /// Deleted and destroyed versions carry no data and yield an empty map.
    #[must_use]
    pub fn from_response(path: String, payload: KvV2Data) -> Self {
        let data = payload
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, render_value(value)))
            .collect();

        let metadata = payload.metadata;
        Self {
            path,
            data,
            metadata: KvVersionMetadata {
                version: metadata.version,
                created_time: metadata.created_time,
                deletion_time: metadata.deletion_time,
                destroyed: metadata.destroyed,
                custom_metadata: metadata.custom_metadata.unwrap_or_default().into_iter().collect(),
            },
        }
    }
}

fn render_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Read access to a KV v2 secrets engine.
#[async_trait]
pub trait KvReader: Send + Sync {
    /// Fetch one secret. Every call goes to the backend.
    async fn read_kv_secret(&self, request: &KvSecretRequest) -> VaultResult<KvSecret>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::KvV2Metadata;
    use std::collections::HashMap;

    #[test]
    fn test_data_path() {
        assert_eq!(kv_v2_data_path("kvv2", "test"), "kvv2/data/test");
        assert_eq!(kv_v2_data_path("/kvv2/", "/apps/web/"), "kvv2/data/apps/web");
    }

    #[test]
    fn test_request_builder() {
        let request = KvSecretRequest::new("kvv2", "test")
            .with_namespace("team-a")
            .with_version(4);
        assert_eq!(request.path(), "kvv2/data/test");
        assert_eq!(request.namespace.as_deref(), Some("team-a"));
        assert_eq!(request.version, Some(4));
    }

    #[test]
    fn test_from_response_renders_values() {
        let mut data = HashMap::new();
        data.insert("user".to_string(), serde_json::json!("admin"));
        data.insert("port".to_string(), serde_json::json!(5432));
        data.insert("tls".to_string(), serde_json::json!(true));
        data.insert("nested".to_string(), serde_json::json!({"a": [1, 2]}));

        let payload = KvV2Data {
            data: Some(data),
            metadata: KvV2Metadata {
                created_time: "2024-01-01T00:00:00Z".parse().unwrap(),
                deletion_time: None,
                destroyed: false,
                version: 7,
                custom_metadata: None,
            },
        };

        let secret = KvSecret::from_response("kvv2/data/db".to_string(), payload);
        assert_eq!(secret.data["user"], "admin");
        assert_eq!(secret.data["port"], "5432");
        assert_eq!(secret.data["tls"], "true");
        assert_eq!(secret.data["nested"], r#"{"a":[1,2]}"#);
        assert_eq!(secret.metadata.version, 7);
        assert!(secret.metadata.custom_metadata.is_empty());
    }
}
