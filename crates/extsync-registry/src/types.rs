//! Request and response types for the registry traits.

use extsync_core::{LocalSource, RemoteSource, ResourceType};
use serde::{Deserialize, Serialize};

/// Payload of a create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExtensionInput {
    /// App the registration belongs to.
    pub api_key: String,
    /// Remote type of the new registration.
    #[serde(rename = "type")]
    pub kind: ResourceType,
    /// Serialized configuration.
    pub config: String,
    pub handle: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl CreateExtensionInput {
    /// Build the create payload for a local source, using its own config.
    #[must_use]
    pub fn for_source(api_key: impl Into<String>, source: &LocalSource) -> Self {
        Self::for_source_with_config(api_key, source, source.config.clone())
    }

    /// Build the create payload for a local source with an explicit config.
    #[must_use]
    pub fn for_source_with_config(
        api_key: impl Into<String>,
        source: &LocalSource,
        config: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            kind: source.graphql_type.clone(),
            config: config.into(),
            handle: source.handle.clone(),
            title: source.handle.clone(),
            context: source.context.clone(),
        }
    }
}

/// Payload of a type migration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateTypeInput {
    pub api_key: String,
    /// Remote id of the registration being migrated.
    pub registration_id: String,
    pub registration_uuid: String,
    pub from_type: ResourceType,
    pub to_type: ResourceType,
}

/// Registrations of one app, split the way the platform reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteListing {
    /// Folder-based registrations.
    #[serde(default)]
    pub extension_registrations: Vec<RemoteSource>,
    /// Registrations that belong to the app configuration.
    #[serde(default)]
    pub configuration_registrations: Vec<RemoteSource>,
    /// Registrations only managed from the dashboard.
    #[serde(default)]
    pub dashboard_managed_registrations: Vec<RemoteSource>,
}

impl RemoteListing {
    /// Total number of registrations across all lists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extension_registrations.len()
            + self.configuration_registrations.len()
            + self.dashboard_managed_registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_input_uses_handle_as_title() {
        let source = LocalSource::new("Payments Extension", "payments_extension", "PAYMENTS")
            .with_context("payments.offsite.render");
        let input = CreateExtensionInput::for_source("appId", &source);

        assert_eq!(input.api_key, "appId");
        assert_eq!(input.kind.as_str(), "PAYMENTS");
        assert_eq!(input.config, "{}");
        assert_eq!(input.handle, "payments-extension");
        assert_eq!(input.title, "payments-extension");
        assert_eq!(input.context.as_deref(), Some("payments.offsite.render"));
    }

    #[test]
    fn test_create_input_serializes_camel_case() {
        let source = LocalSource::new("A", "function", "FUNCTION");
        let input = CreateExtensionInput::for_source("key", &source);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({
                "apiKey": "key",
                "type": "FUNCTION",
                "config": "{}",
                "handle": "a",
                "title": "a"
            })
        );
    }

    #[test]
    fn test_listing_defaults_missing_lists() {
        let listing: RemoteListing = serde_json::from_value(json!({
            "extensionRegistrations": [
                {"uuid": "UUID_A", "id": "A", "title": "A", "type": "CHECKOUT_POST_PURCHASE"}
            ]
        }))
        .unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing.configuration_registrations.is_empty());
        assert!(!listing.is_empty());
    }
}
