use anyhow::Result;

use crate::cli::{OutputFormat, PlanArgs};
use crate::config::ProfileConfig;
use crate::output::print_plan;
use crate::session::Session;

/// Match without creating or migrating anything remotely.
pub async fn plan(
    args: &PlanArgs,
    api_key: Option<&str>,
    state: Option<&std::path::Path>,
    profile: &ProfileConfig,
    format: OutputFormat,
) -> Result<()> {
    let session = Session::open(&args.project, api_key, state, false, profile).await?;
    let plan = session.reconciler(args.yes)?.plan(&session.local).await?;
    print_plan(&plan, format)
}
