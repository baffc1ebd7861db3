use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::{DeployArgs, OutputFormat};
use crate::config::ProfileConfig;
use crate::output::{print_deployment_ids, print_success};
use crate::session::Session;

pub async fn deploy(
    args: &DeployArgs,
    api_key: Option<&str>,
    state: Option<&Path>,
    profile: &ProfileConfig,
    format: OutputFormat,
) -> Result<()> {
    let mut session =
        Session::open(&args.project, api_key, state, args.include_config, profile).await?;
    session.options.force = args.force;
    session.options.release = args.release;
    session.options.include_draft_extensions = args.draft;

    let result = session
        .reconciler(args.yes)?
        .ensure_deployment_ids(&session.local)
        .await;
    // Registrations created before a failure must survive for the next run.
    session.persist().await?;
    let ids = result?;

    print_deployment_ids(&ids, format)?;

    if args.write_identifiers {
        let recorded = ids.recorded_identifiers(session.options.match_key);
        session.project.record_identifiers(&recorded);
        session.project.save(&session.project_path)?;
        info!(
            project = %session.project_path.display(),
            match_key = %session.options.match_key,
            "Identifiers recorded"
        );
    }
    if format == OutputFormat::Table {
        print_success(&format!("{} extensions deployed", ids.extensions.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::project::ProjectSnapshot;
    use extsync_core::MatchKey;
    use extsync_reconcile::StaticResolver;
    use serde_json::json;

    fn args(project: &Path) -> DeployArgs {
        DeployArgs {
            project: project.to_path_buf(),
            force: true,
            yes: true,
            include_config: false,
            draft: false,
            release: false,
            write_identifiers: true,
        }
    }

    #[tokio::test]
    async fn test_deploy_creates_and_records_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("extsync.json");
        std::fs::write(
            &project_path,
            json!({
                "apiKey": "appId",
                "sources": [{"title": "EXTENSION A", "type": "checkout_post_purchase"}]
            })
            .to_string(),
        )
        .unwrap();

        deploy(
            &args(&project_path),
            None,
            None,
            &ProfileConfig::default(),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let project = ProjectSnapshot::load(&project_path).unwrap();
        let identifiers = project.identifiers.unwrap();
        assert!(identifiers.contains_key("extension-a"));
        assert!(dir.path().join("extsync-state.json").exists());

        // Second run reuses the recorded uuid and creates nothing new.
        deploy(
            &args(&project_path),
            None,
            None,
            &ProfileConfig::default(),
            OutputFormat::Json,
        )
        .await
        .unwrap();
        let again = ProjectSnapshot::load(&project_path).unwrap();
        assert_eq!(again.identifiers.unwrap(), identifiers);
    }

    #[tokio::test]
    async fn test_id_match_key_survives_dashboard_rename() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("extsync.json");
        std::fs::write(
            &project_path,
            json!({
                "apiKey": "appId",
                "sources": [{"title": "EXTENSION A", "type": "checkout_post_purchase"}]
            })
            .to_string(),
        )
        .unwrap();
        let profile = ProfileConfig {
            match_key: Some(MatchKey::Id),
            ..Default::default()
        };

        deploy(&args(&project_path), None, None, &profile, OutputFormat::Json)
            .await
            .unwrap();

        let state_path = dir.path().join("extsync-state.json");
        let mut state: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
        let registration = &mut state["extensionRegistrations"][0];
        let remote_id = registration["id"].as_str().unwrap().to_string();
        registration["title"] = json!("Dashboard Name");
        std::fs::write(&state_path, state.to_string()).unwrap();

        let project = ProjectSnapshot::load(&project_path).unwrap();
        assert_eq!(
            project.identifiers.as_ref().unwrap().get("extension-a"),
            Some(&remote_id)
        );

        // A declined rename would move the source to creation.
        let session = Session::open(&project_path, None, None, false, &profile)
            .await
            .unwrap();
        let plan = session
            .with_resolver(Arc::new(StaticResolver::decline_all()))
            .plan(&session.local)
            .await
            .unwrap();

        assert!(plan.extensions.extensions_to_create.is_empty());
        assert!(plan.extensions.valid_matches.contains_key("extension-a"));
    }
}
