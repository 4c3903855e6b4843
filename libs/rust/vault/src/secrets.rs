//! Vault HTTP API response bodies.
//!
//! Only the fields the client reads are modelled; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Vault KV v2 read response wrapper
#[derive(Debug, Deserialize)]
pub struct KvV2Response {
    /// Secret payload
    pub data: KvV2Data,
    /// Non-fatal notices from Vault
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// Payload of a KV v2 read. `data` is null for deleted or destroyed versions.
#[derive(Debug, Deserialize)]
pub struct KvV2Data {
    /// Secret key/value pairs
    #[serde(default)]
    pub data: Option<HashMap<String, serde_json::Value>>,
    /// Version metadata
    pub metadata: KvV2Metadata,
}

/// Version metadata returned alongside KV v2 data
#[derive(Debug, Deserialize)]
#[allow(missing_docs)]
pub struct KvV2Metadata {
    pub created_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub deletion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub destroyed: bool,
    pub version: u64,
    #[serde(default)]
    pub custom_metadata: Option<HashMap<String, String>>,
}

/// Error body Vault sends with non-2xx statuses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    /// Messages joined into error details
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `auth/token/lookup-self` response wrapper
#[derive(Debug, Deserialize)]
pub struct TokenLookupResponse {
    /// Token properties
    pub data: TokenInfo,
}

/// Properties of the token the client authenticates with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Accessor, safe to log in place of the token
    #[serde(default)]
    pub accessor: String,
    /// Name Vault shows for the token
    #[serde(default)]
    pub display_name: String,
    /// Attached policies
    #[serde(default)]
    pub policies: Vec<String>,
    /// Remaining time to live in seconds, 0 for root tokens
    #[serde(default)]
    pub ttl: u64,
    /// Whether the token can be renewed before `ttl` runs out
    #[serde(default)]
    pub renewable: bool,
}

/// Vault reports "not deleted" as an empty string rather than null.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_response_deserialize() {
        let json = r#"{
            "request_id": "0e1f",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "data": {
                "data": {"username": "admin", "port": 5432},
                "metadata": {
                    "created_time": "2024-01-01T00:00:00.000000000Z",
                    "custom_metadata": null,
                    "deletion_time": "",
                    "destroyed": false,
                    "version": 3
                }
            },
            "wrap_info": null,
            "warnings": null,
            "auth": null
        }"#;
        let resp: KvV2Response = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.metadata.version, 3);
        assert!(resp.data.metadata.deletion_time.is_none());
        assert!(resp.data.metadata.custom_metadata.is_none());
        let data = resp.data.data.unwrap();
        assert_eq!(data.get("username").unwrap(), "admin");
        assert_eq!(data.get("port").unwrap(), 5432);
    }

    #[test]
    fn test_deleted_version_has_null_data() {
        let json = r#"{
            "data": {
                "data": null,
                "metadata": {
                    "created_time": "2024-01-01T00:00:00Z",
                    "deletion_time": "2024-02-01T12:30:00Z",
                    "destroyed": false,
                    "version": 2
                }
            }
        }"#;
        let resp: KvV2Response = serde_json::from_str(json).unwrap();
        assert!(resp.data.data.is_none());
        assert!(resp.data.metadata.deletion_time.is_some());
    }

    #[test]
    fn test_error_response_defaults() {
        let resp: ErrorResponse = serde_json::from_str(r#"{"errors":["permission denied"]}"#).unwrap();
        assert_eq!(resp.errors, vec!["permission denied".to_string()]);

        let resp: ErrorResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn test_token_lookup_deserialize() {
        let json = r#"{"data": {"accessor": "acc", "display_name": "token", "policies": ["default"], "ttl": 3600, "renewable": true, "id": "ignored"}}"#;
        let resp: TokenLookupResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.policies, vec!["default".to_string()]);
        assert_eq!(resp.data.ttl, 3600);
        assert_eq!(resp.data.accessor, "acc");
        assert!(resp.data.renewable);
    }
}
