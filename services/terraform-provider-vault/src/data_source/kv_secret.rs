//! `vault_kv_secret` data source.
//!
//! Reads one secret from a KV version 2 engine on every refresh. Nothing is
//! cached between reads; Terraform diffs the returned state itself.

use crate::session::ClientSession;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueMap, ValueNumber, ValueString};
use tf_provider::{AttributePath, DataSource, Diagnostics, map};
use tracing::{debug, instrument, warn};
use vault_kv_client::{KvSecret, KvSecretRequest, KvVersionMetadata, kv_v2_data_path};

/// Summary of the diagnostic raised when the remote read fails.
pub const READ_FAILED: &str = "Failed to read secret";

/// Data source state, one field per schema attribute.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvSecretState<'a> {
    /// Same as `path`
    pub id: ValueString<'a>,
    /// Mount point of the KV-V2 engine
    pub mount: ValueString<'a>,
    /// Secret name below the mount
    pub name: ValueString<'a>,
    /// Overrides the provider namespace
    pub namespace: ValueString<'a>,
    /// `{mount}/data/{name}`
    pub path: ValueString<'a>,
    /// Secret key/value pairs
    pub data: ValueMap<'a, ValueString<'a>>,
    /// Pinned version, or the version that was read
    pub version: ValueNumber,
    /// Version metadata
    pub metadata: Value<KvSecretMetadata<'a>>,
}

/// `metadata` object attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct KvSecretMetadata<'a> {
    pub created_time: ValueString<'a>,
    pub deletion_time: ValueString<'a>,
    pub destroyed: ValueBool,
    pub version: ValueNumber,
    pub custom_metadata: ValueMap<'a, ValueString<'a>>,
}

impl KvSecretState<'_> {
    /// Configuration for reading the latest version of `name` under `mount`.
    #[must_use]
    pub fn config(mount: &str, name: &str) -> Self {
        Self {
            mount: Value::Value(Cow::Owned(mount.to_string())),
            name: Value::Value(Cow::Owned(name.to_string())),
            ..Self::default()
        }
    }

    /// Build the read request from the configured attributes.
    fn request(&self, diags: &mut Diagnostics) -> Option<KvSecretRequest> {
        let mount = required(&self.mount, "mount", diags);
        let name = required(&self.name, "name", diags);
        let (mount, name) = (mount?, name?);

        let mut request = KvSecretRequest::new(mount, name);

        if let Some(namespace) = self.namespace.as_deref_option().filter(|ns| !ns.is_empty()) {
            request = request.with_namespace(namespace);
        }

        if let Value::Value(version) = self.version {
            match u64::try_from(version) {
                Ok(version) if version > 0 => request = request.with_version(version),
                _ => {
                    invalid_version(version, diags);
                    return None;
                }
            }
        }

        Some(request)
    }

    /// Fill the computed attributes from a secret, keeping the configured ones.
    #[must_use]
    pub fn with_secret(self, secret: KvSecret) -> Self {
        let path: Cow<'_, str> = Cow::Owned(secret.path);
        let data = secret
            .data
            .into_iter()
            .map(|(key, value)| (Cow::Owned(key), Value::Value(Cow::Owned(value))))
            .collect::<BTreeMap<Cow<'_, str>, ValueString<'_>>>();

        Self {
            id: Value::Value(path.clone()),
            path: Value::Value(path),
            data: Value::Value(data),
            version: i64::try_from(secret.metadata.version).ok().into(),
            metadata: Value::Value(KvSecretMetadata::from(secret.metadata)),
            ..self
        }
    }
}

impl From<KvVersionMetadata> for KvSecretMetadata<'_> {
    fn from(metadata: KvVersionMetadata) -> Self {
        Self {
            created_time: Value::Value(Cow::Owned(timestamp(metadata.created_time))),
            deletion_time: match metadata.deletion_time {
                Some(time) => Value::Value(Cow::Owned(timestamp(time))),
                None => Value::Null,
            },
            destroyed: Value::Value(metadata.destroyed),
            version: i64::try_from(metadata.version).ok().into(),
            custom_metadata: Value::Value(
                metadata
                    .custom_metadata
                    .into_iter()
                    .map(|(k, v)| (Cow::Owned(k), Value::Value(Cow::Owned(v))))
                    .collect(),
            ),
        }
    }
}

/// Secret values stay out of logs; only the keys are printed.
impl fmt::Debug for KvSecretState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Value<Vec<&str>> = self
            .data
            .as_ref()
            .map(|data| data.keys().map(|key| key.as_ref()).collect());
        f.debug_struct("KvSecretState")
            .field("id", &self.id)
            .field("mount", &self.mount)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("path", &self.path)
            .field("data_keys", &keys)
            .field("version", &self.version)
            .field("metadata", &self.metadata)
            .finish()
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn required(value: &ValueString<'_>, attribute: &'static str, diags: &mut Diagnostics) -> Option<String> {
    match value {
        Value::Value(v) if !v.trim_matches('/').is_empty() => Some(v.to_string()),
        Value::Value(_) | Value::Null => {
            diags.error(
                format!("Missing `{attribute}`"),
                format!("`{attribute}` must be a non-empty string"),
                AttributePath::new(attribute),
            );
            None
        }
        Value::Unknown => {
            diags.error(
                format!("Unknown `{attribute}`"),
                format!("`{attribute}` must be known before the secret can be read"),
                AttributePath::new(attribute),
            );
            None
        }
    }
}

fn invalid_version(version: i64, diags: &mut Diagnostics) {
    diags.error(
        "Invalid secret version",
        format!("`version` must be a positive integer, got {version}"),
        AttributePath::new("version"),
    );
}

/// `vault_kv_secret` data source.
#[derive(Debug, Clone)]
pub struct KvSecretDataSource {
    session: ClientSession,
}

impl KvSecretDataSource {
    /// Data source reading through `session`.
    #[must_use]
    pub const fn new(session: ClientSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DataSource for KvSecretDataSource {
    type State<'a> = KvSecretState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let metadata_type: HashMap<String, AttributeType> = map! {
            "created_time" => AttributeType::String,
            "deletion_time" => AttributeType::String,
            "destroyed" => AttributeType::Bool,
            "version" => AttributeType::Number,
            "custom_metadata" => AttributeType::Map(Box::new(AttributeType::String)),
        };

        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                description: Description::plain("Reads a secret from Vault KV Version 2 backend"),
                attributes: map! {
                    "mount" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("The mount point of the KV-V2 secret engine"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the secret"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "namespace" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "Namespace of the secret, defaults to the provider namespace",
                        ),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "path" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Full path of the secret"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "data" => Attribute {
                        attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                        description: Description::plain("Secret data"),
                        constraint: AttributeConstraint::Computed,
                        sensitive: true,
                        ..Default::default()
                    },
                    "version" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain(
                            "Version (iteration) of the secret to retrieve, latest when unset",
                        ),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "metadata" => Attribute {
                        attr_type: AttributeType::Object(metadata_type),
                        description: Description::plain("Metadata about the secret"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Same as `path`"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        for (attribute, value) in [("mount", &config.mount), ("name", &config.name)] {
            if let Value::Value(v) = value {
                if v.trim_matches('/').is_empty() {
                    diags.error_short(
                        format!("`{attribute}` must not be empty"),
                        AttributePath::new(attribute),
                    );
                }
            }
        }

        if let Value::Value(version) = config.version {
            if version <= 0 {
                invalid_version(version, diags);
            }
        }

        Some(())
    }

    #[instrument(skip_all, fields(mount = ?config.mount, name = ?config.name))]
    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let request = config.request(diags)?;

        let client = match self.session.client() {
            Ok(client) => client,
            Err(err) => {
                err.report(diags);
                return None;
            }
        };

        match client.read_kv_secret(&request).await {
            Ok(secret) => {
                debug!(path = %secret.path, keys = secret.data.len(), "Secret read");
                Some(config.with_secret(secret))
            }
            Err(err) => {
                warn!(path = %kv_v2_data_path(&request.mount, &request.name), error = %err, "Secret read failed");
                diags.root_error(READ_FAILED, err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_config() {
        let mut diags = Diagnostics::default();
        let mut config = KvSecretState::config("kvv2", "test");
        config.namespace = Value::Value(Cow::Borrowed("team-a"));
        config.version = Value::Value(3);

        let request = config.request(&mut diags).unwrap();
        assert!(diags.errors.is_empty());
        assert_eq!(request.path(), "kvv2/data/test");
        assert_eq!(request.namespace.as_deref(), Some("team-a"));
        assert_eq!(request.version, Some(3));
    }

    #[test]
    fn test_request_rejects_negative_version() {
        let mut diags = Diagnostics::default();
        let mut config = KvSecretState::config("kvv2", "test");
        config.version = Value::Value(-1);

        assert!(config.request(&mut diags).is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("version"));
    }

    #[test]
    fn test_request_reports_both_missing_attributes() {
        let mut diags = Diagnostics::default();
        let config = KvSecretState::default();

        assert!(config.request(&mut diags).is_none());
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn test_empty_namespace_uses_provider_default() {
        let mut diags = Diagnostics::default();
        let mut config = KvSecretState::config("kvv2", "test");
        config.namespace = Value::Value(Cow::Borrowed(""));

        let request = config.request(&mut diags).unwrap();
        assert!(request.namespace.is_none());
    }

    #[test]
    fn test_metadata_timestamps() {
        let metadata = KvVersionMetadata {
            version: 2,
            created_time: "2024-01-01T00:00:00Z".parse().unwrap(),
            deletion_time: None,
            destroyed: false,
            custom_metadata: BTreeMap::new(),
        };

        let state = KvSecretMetadata::from(metadata);
        assert_eq!(state.created_time, Value::Value(Cow::Borrowed("2024-01-01T00:00:00Z")));
        assert_eq!(state.deletion_time, Value::Null);
        assert_eq!(state.version, Value::Value(2));
    }

    #[test]
    fn test_schema_declares_every_state_field() {
        let data_source = KvSecretDataSource::new(ClientSession::new());
        let schema = data_source.schema(&mut Diagnostics::default()).unwrap();
        let attributes = schema.block.attributes;

        for name in ["id", "mount", "name", "namespace", "path", "data", "version", "metadata"] {
            assert!(attributes.contains_key(name), "missing attribute {name}");
        }
        assert_eq!(attributes["mount"].constraint, AttributeConstraint::Required);
        assert_eq!(attributes["namespace"].constraint, AttributeConstraint::Optional);
        assert!(attributes["data"].sensitive);
    }

    #[test]
    fn test_debug_hides_secret_values() {
        let mut data = BTreeMap::new();
        data.insert(Cow::Borrowed("password"), Value::Value(Cow::Borrowed("hunter2")));
        let state = KvSecretState {
            data: Value::Value(data),
            ..KvSecretState::config("kvv2", "test")
        };

        let debug = format!("{state:?}");
        assert!(debug.contains("password"));
        assert!(!debug.contains("hunter2"));
    }
}
