//! Project snapshot: the JSON file declaring local sources.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use extsync_core::{IdentifierMap, LocalSource, SourceDeclaration, SpecificationRegistry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Handle to uuid, as recorded by the last deploy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<IdentifierMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_config_on_deploy: Option<bool>,
    #[serde(default)]
    pub sources: Vec<SourceDeclaration>,
}

impl ProjectSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read project {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid project {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content + "\n")
            .with_context(|| format!("Cannot write project {}", path.display()))
    }

    /// Resolve every declaration against `specs`, in file order.
    pub fn local_sources(&self, specs: &SpecificationRegistry) -> Result<Vec<LocalSource>> {
        self.sources
            .iter()
            .map(|declaration| {
                specs
                    .resolve(declaration.clone())
                    .with_context(|| format!("Invalid source '{}'", declaration.title))
            })
            .collect()
    }

    /// Replace the recorded identifiers with `extensions`.
    pub fn record_identifiers(&mut self, extensions: &IdentifierMap) {
        self.identifiers = Some(extensions.clone());
    }
}
