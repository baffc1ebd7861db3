//! Everything a plan or deploy needs, resolved from flags, profile and project.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use extsync_core::{LocalSource, SpecificationRegistry};
use extsync_reconcile::{DynResolver, ReconcileOptions, Reconciler, StaticResolver};
use extsync_registry_memory::InMemoryRegistry;
use tracing::debug;

use crate::config::ProfileConfig;
use crate::project::ProjectSnapshot;
use crate::prompt::{TerminalResolver, is_interactive_terminal};

const DEFAULT_STATE_FILE: &str = "extsync-state.json";

pub struct Session {
    pub project_path: PathBuf,
    pub project: ProjectSnapshot,
    pub local: Vec<LocalSource>,
    pub options: ReconcileOptions,
    pub state_path: PathBuf,
    pub registry: Arc<InMemoryRegistry>,
    specs: SpecificationRegistry,
}

/// Flag or env, then profile, then project.
pub fn resolve_api_key(
    flag: Option<&str>,
    profile: &ProfileConfig,
    project: &ProjectSnapshot,
) -> Result<String> {
    flag.or(profile.api_key.as_deref())
        .or(project.api_key.as_deref())
        .map(str::to_string)
        .context("No API key. Pass --api-key, set EXTSYNC_API_KEY or run `extsync config set api_key <key>`")
}

/// Flag or env, then profile, then a state file next to the project.
pub fn resolve_state_path(
    flag: Option<&Path>,
    profile: &ProfileConfig,
    project_path: &Path,
) -> PathBuf {
    if let Some(path) = flag.or(profile.state.as_deref()) {
        return path.to_path_buf();
    }
    project_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DEFAULT_STATE_FILE)
}

/// Flag, then profile, then project, else off.
pub fn resolve_include_config(
    flag: bool,
    profile: &ProfileConfig,
    project: &ProjectSnapshot,
) -> bool {
    flag || profile
        .include_config_on_deploy
        .or(project.include_config_on_deploy)
        .unwrap_or(false)
}

impl Session {
    pub async fn open(
        project_path: &Path,
        api_key: Option<&str>,
        state: Option<&Path>,
        include_config: bool,
        profile: &ProfileConfig,
    ) -> Result<Self> {
        let project = ProjectSnapshot::load(project_path)?;
        let specs = SpecificationRegistry::builtin();
        let local = project.local_sources(&specs)?;

        let mut options = ReconcileOptions::new(resolve_api_key(api_key, profile, &project)?);
        options.identifiers = project.identifiers.clone().unwrap_or_default();
        options.include_config_on_deploy = resolve_include_config(include_config, profile, &project);
        options.match_key = profile.match_key.unwrap_or_default();

        let state_path = resolve_state_path(state, profile, project_path);
        let registry = InMemoryRegistry::load(&state_path)
            .await
            .with_context(|| format!("Cannot load registry state {}", state_path.display()))?;
        debug!(
            project = %project_path.display(),
            state = %state_path.display(),
            sources = local.len(),
            "Session opened"
        );

        Ok(Self {
            project_path: project_path.to_path_buf(),
            project,
            local,
            options,
            state_path,
            registry: Arc::new(registry),
            specs,
        })
    }

    /// Build a reconciler. `yes` answers every question with yes.
    ///
    /// Without `yes` a terminal is required for the prompts.
    pub fn reconciler(&self, yes: bool) -> Result<Reconciler> {
        let resolver: DynResolver = if yes {
            Arc::new(StaticResolver::accept_all())
        } else {
            if !is_interactive_terminal() {
                anyhow::bail!(
                    "Interactive prompts require a terminal. Pass --yes to accept every prompt"
                );
            }
            Arc::new(TerminalResolver::new())
        };
        Ok(self.with_resolver(resolver))
    }

    /// Build a reconciler that asks `resolver`.
    pub fn with_resolver(&self, resolver: DynResolver) -> Reconciler {
        Reconciler::new(self.registry.clone(), resolver, self.options.clone())
            .with_specifications(self.specs.clone())
    }

    pub async fn persist(&self) -> Result<()> {
        self.registry
            .save(&self.state_path)
            .await
            .with_context(|| format!("Cannot save registry state {}", self.state_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_with_key(key: Option<&str>) -> ProjectSnapshot {
        ProjectSnapshot {
            api_key: key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_api_key_precedence() {
        let profile = ProfileConfig {
            api_key: Some("profile".to_string()),
            ..Default::default()
        };
        let project = project_with_key(Some("project"));

        assert_eq!(resolve_api_key(Some("flag"), &profile, &project).unwrap(), "flag");
        assert_eq!(resolve_api_key(None, &profile, &project).unwrap(), "profile");
        assert_eq!(
            resolve_api_key(None, &ProfileConfig::default(), &project).unwrap(),
            "project"
        );
        assert!(resolve_api_key(None, &ProfileConfig::default(), &project_with_key(None)).is_err());
    }

    #[test]
    fn test_state_path_defaults_next_to_project() {
        let path = resolve_state_path(
            None,
            &ProfileConfig::default(),
            Path::new("/work/app/extsync.json"),
        );
        assert_eq!(path, PathBuf::from("/work/app/extsync-state.json"));

        let profile = ProfileConfig {
            state: Some(PathBuf::from("/tmp/profile.json")),
            ..Default::default()
        };
        let path = resolve_state_path(None, &profile, Path::new("extsync.json"));
        assert_eq!(path, PathBuf::from("/tmp/profile.json"));
    }

    #[test]
    fn test_include_config_precedence() {
        let profile = ProfileConfig {
            include_config_on_deploy: Some(false),
            ..Default::default()
        };
        let project = ProjectSnapshot {
            include_config_on_deploy: Some(true),
            ..Default::default()
        };

        assert!(resolve_include_config(true, &profile, &project));
        assert!(!resolve_include_config(false, &profile, &project));
        assert!(resolve_include_config(false, &ProfileConfig::default(), &project));
        assert!(!resolve_include_config(
            false,
            &ProfileConfig::default(),
            &ProjectSnapshot::default()
        ));
    }

    #[tokio::test]
    async fn test_open_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("extsync.json");
        std::fs::write(
            &project_path,
            json!({
                "apiKey": "appId",
                "identifiers": {"extension-a": "UUID_A"},
                "sources": [{"title": "EXTENSION A", "type": "checkout_post_purchase"}]
            })
            .to_string(),
        )
        .unwrap();

        let session = Session::open(&project_path, None, None, false, &ProfileConfig::default())
            .await
            .unwrap();
        assert_eq!(session.options.api_key, "appId");
        assert_eq!(session.local.len(), 1);
        assert_eq!(
            session.options.identifiers.get("extension-a").map(String::as_str),
            Some("UUID_A")
        );
        assert_eq!(session.state_path, dir.path().join("extsync-state.json"));

        session.persist().await.unwrap();
        assert!(session.state_path.exists());
    }
}
