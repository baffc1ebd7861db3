use serde::{Deserialize, Deserializer, Serialize};

/// Remote type discriminator of a registration (the `graphQLType`).
///
/// Always stored upper case so comparisons are plain equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ResourceType::new(raw))
    }
}

impl From<&str> for ResourceType {
    fn from(value: &str) -> Self {
        ResourceType::new(value)
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        ResourceType::new(value)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How identifiers are assigned for a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePolicy {
    /// One remote uuid per handle, matched by the automatic and manual matchers.
    #[default]
    Canonical,
    /// Single remote instance owned by the inline app configuration, matched by type.
    ConfigurationManaged,
    /// Any number of remote instances, matched by deep content equality.
    MultiInstance,
}

impl TypePolicy {
    pub fn is_canonical(&self) -> bool {
        matches!(self, TypePolicy::Canonical)
    }

    pub fn is_configuration_managed(&self) -> bool {
        matches!(
            self,
            TypePolicy::ConfigurationManaged | TypePolicy::MultiInstance
        )
    }
}

impl std::fmt::Display for TypePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypePolicy::Canonical => write!(f, "canonical"),
            TypePolicy::ConfigurationManaged => write!(f, "configuration-managed"),
            TypePolicy::MultiInstance => write!(f, "multi-instance"),
        }
    }
}
