//! Local sources and remote registrations.
//!
//! Both are read-only inputs to a reconciliation run: local sources come from
//! the project, remote sources from a registry listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handle::slugify;
use crate::resource_type::{ResourceType, TypePolicy};

/// A locally declared deployable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSource {
    /// Stable slug identifying the source
    pub handle: String,

    /// Human readable name
    pub title: String,

    /// Local type tag, e.g. `checkout_post_purchase`
    #[serde(rename = "type")]
    pub kind: String,

    /// Remote type discriminator
    #[serde(rename = "graphQLType")]
    pub graphql_type: ResourceType,

    /// Declared remote uuid, if the project pinned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Serialized configuration payload sent on creation
    #[serde(default = "empty_config")]
    pub config: String,

    /// Sub-target discriminator for types with several activation contexts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub policy: TypePolicy,

    /// Declared instance payloads (multi-instance types only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Value>,
}

fn empty_config() -> String {
    "{}".to_string()
}

impl LocalSource {
    /// Create a canonical source whose handle is derived from the title.
    pub fn new(
        title: impl Into<String>,
        kind: impl Into<String>,
        graphql_type: impl Into<ResourceType>,
    ) -> Self {
        let title = title.into();
        Self {
            handle: slugify(&title),
            title,
            kind: kind.into(),
            graphql_type: graphql_type.into(),
            uuid: None,
            config: empty_config(),
            context: None,
            policy: TypePolicy::Canonical,
            instances: Vec::new(),
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = handle.into();
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_policy(mut self, policy: TypePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_instances(mut self, instances: Vec<Value>) -> Self {
        self.instances = instances;
        self
    }

    pub fn is_canonical(&self) -> bool {
        self.policy.is_canonical()
    }

    /// Same remote type as `remote`.
    pub fn same_type(&self, remote: &RemoteSource) -> bool {
        self.graphql_type == remote.kind
    }

    /// The remote title equals this source's title or handle.
    pub fn title_matches(&self, remote: &RemoteSource) -> bool {
        remote.title == self.title || remote.title == self.handle
    }
}

/// Last published version of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveVersion {
    /// Serialized configuration content
    pub config: String,
}

/// Unpublished draft of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftVersion {
    pub config: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_interaction_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
}

/// A registration previously created in the remote registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSource {
    pub uuid: String,
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(
        default,
        alias = "contextValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_version: Option<ActiveVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_version: Option<DraftVersion>,
}

impl RemoteSource {
    pub fn new(
        uuid: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
        kind: impl Into<ResourceType>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            id: id.into(),
            title: title.into(),
            kind: kind.into(),
            context: None,
            active_version: None,
            draft_version: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach a published version holding `config`.
    pub fn with_active_config(mut self, config: &Value) -> Self {
        self.active_version = Some(ActiveVersion {
            config: config.to_string(),
        });
        self
    }

    /// Decode the published configuration.
    ///
    /// Returns `None` when nothing is published or the payload is not valid JSON.
    pub fn published_config(&self) -> Option<Value> {
        let version = self.active_version.as_ref()?;
        match serde_json::from_str(&version.config) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(
                    uuid = %self.uuid,
                    error = %e,
                    "Ignoring undecodable published config"
                );
                None
            }
        }
    }
}
