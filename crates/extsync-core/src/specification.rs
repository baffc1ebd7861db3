//! Resource-type specifications.
//!
//! Every known extension type is described once by a [`TypeSpecification`].
//! The [`SpecificationRegistry`] resolves the list into lookup tables at
//! startup so the matching code only ever sees [`TypePolicy`] values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::handle::{is_valid_handle, slugify};
use crate::resource_type::{ResourceType, TypePolicy};
use crate::source::LocalSource;

/// Metadata for one extension type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSpecification {
    /// Local type tag used in project declarations
    pub identifier: String,

    /// Remote type discriminator
    #[serde(rename = "graphQLType")]
    pub graphql_type: ResourceType,

    pub policy: TypePolicy,

    /// Remote types superseded by this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_types: Vec<ResourceType>,
}

impl TypeSpecification {
    pub fn new(
        identifier: impl Into<String>,
        graphql_type: impl Into<ResourceType>,
        policy: TypePolicy,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            graphql_type: graphql_type.into(),
            policy,
            legacy_types: Vec::new(),
        }
    }

    pub fn with_legacy_types<I, T>(mut self, legacy: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        self.legacy_types = legacy.into_iter().map(Into::into).collect();
        self
    }

    /// `remote` is a known predecessor of this type.
    pub fn supersedes(&self, remote: &ResourceType) -> bool {
        self.legacy_types.iter().any(|legacy| legacy == remote)
    }
}

/// Type to policy table, built once per process.
#[derive(Debug, Clone, Default)]
pub struct SpecificationRegistry {
    by_type: IndexMap<ResourceType, TypeSpecification>,
    by_identifier: IndexMap<String, ResourceType>,
}

impl SpecificationRegistry {
    pub fn new(specifications: impl IntoIterator<Item = TypeSpecification>) -> Self {
        let mut registry = Self::default();
        for spec in specifications {
            registry.register(spec);
        }
        registry
    }

    /// The extension types extsync knows out of the box.
    pub fn builtin() -> Self {
        use TypePolicy::*;

        Self::new([
            TypeSpecification::new("checkout_post_purchase", "CHECKOUT_POST_PURCHASE", Canonical),
            TypeSpecification::new("subscription_management", "SUBSCRIPTION_MANAGEMENT", Canonical),
            TypeSpecification::new("ui_extension", "UI_EXTENSION", Canonical).with_legacy_types([
                "CHECKOUT_UI_EXTENSION",
                "POS_UI_EXTENSION",
                "CHECKOUT_POST_PURCHASE",
            ]),
            TypeSpecification::new("flow_action", "FLOW_ACTION", Canonical)
                .with_legacy_types(["FLOW_ACTION_DEFINITION"]),
            TypeSpecification::new("function", "FUNCTION", Canonical),
            TypeSpecification::new("payments_extension", "PAYMENTS", Canonical),
            TypeSpecification::new("theme", "THEME_APP_EXTENSION", Canonical),
            TypeSpecification::new("point_of_sale", "POINT_OF_SALE", ConfigurationManaged),
            TypeSpecification::new("app_access", "APP_ACCESS", ConfigurationManaged),
            TypeSpecification::new("branding", "BRANDING", ConfigurationManaged),
            TypeSpecification::new("webhook_subscription", "WEBHOOK_SUBSCRIPTION", MultiInstance),
        ])
    }

    /// Add or replace a specification.
    pub fn register(&mut self, spec: TypeSpecification) {
        let identifier = spec.identifier.to_ascii_lowercase();
        if let Some(previous) = self.by_type.get(&spec.graphql_type) {
            tracing::warn!(
                graphql_type = %spec.graphql_type,
                previous = %previous.identifier,
                identifier = %spec.identifier,
                "Replacing extension specification"
            );
        }
        self.by_identifier
            .insert(identifier, spec.graphql_type.clone());
        self.by_type.insert(spec.graphql_type.clone(), spec);
    }

    pub fn get(&self, graphql_type: &ResourceType) -> Option<&TypeSpecification> {
        self.by_type.get(graphql_type)
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<&TypeSpecification> {
        self.by_identifier
            .get(&identifier.to_ascii_lowercase())
            .and_then(|ty| self.by_type.get(ty))
    }

    /// Policy for a remote type. Unknown types are canonical.
    pub fn policy_for(&self, graphql_type: &ResourceType) -> TypePolicy {
        self.get(graphql_type)
            .map(|spec| spec.policy)
            .unwrap_or_default()
    }

    pub fn is_configuration_managed(&self, graphql_type: &ResourceType) -> bool {
        self.policy_for(graphql_type).is_configuration_managed()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeSpecification> {
        self.by_type.values()
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Turn a project declaration into a [`LocalSource`].
    pub fn resolve(&self, declaration: SourceDeclaration) -> Result<LocalSource> {
        let spec = self
            .by_identifier(&declaration.kind)
            .or_else(|| self.get(&ResourceType::new(&declaration.kind)))
            .ok_or_else(|| CoreError::unknown_type(&declaration.kind))?;

        let handle = match declaration.handle {
            Some(handle) if is_valid_handle(&handle) => handle,
            Some(handle) => return Err(CoreError::invalid_handle(handle)),
            None => {
                let derived = slugify(&declaration.title);
                if derived.is_empty() {
                    return Err(CoreError::invalid_handle(declaration.title));
                }
                derived
            }
        };

        if !declaration.instances.is_empty() && spec.policy != TypePolicy::MultiInstance {
            return Err(CoreError::invalid_config(
                handle,
                format!("type '{}' does not accept instances", spec.identifier),
            ));
        }
        if let Some(position) = declaration.instances.iter().position(|i| !i.is_object()) {
            return Err(CoreError::invalid_config(
                handle,
                format!("instance {position} is not an object"),
            ));
        }

        let config = match &declaration.config {
            Some(value) => serde_json::to_string(value)?,
            None => "{}".to_string(),
        };

        Ok(LocalSource {
            handle,
            title: declaration.title,
            kind: spec.identifier.clone(),
            graphql_type: spec.graphql_type.clone(),
            uuid: declaration.uuid,
            config,
            context: declaration.context,
            policy: spec.policy,
            instances: declaration.instances,
        })
    }
}

/// A source as written in a project snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDeclaration {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Value>,
}

impl SourceDeclaration {
    pub fn new(title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            handle: None,
            kind: kind.into(),
            uuid: None,
            config: None,
            context: None,
            instances: Vec::new(),
        }
    }
}
