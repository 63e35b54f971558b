pub mod config;
pub mod init;
pub mod lint;
pub mod new;
pub mod next;
pub mod reset;
pub mod status;

use anyhow::Context;
use stagehand_core::{
    fs::OsFileSystem,
    git::GitCli,
    links::{HttpUrlChecker, UrlChecker},
    lint::{BaseView, EvalContext},
    plan::{PlanContext, Workspace},
    templates::EmbeddedTemplates,
};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Load the workspace and the plan a command targets.
pub fn open_plan(root: &Path, name: Option<&str>) -> anyhow::Result<(Workspace, PlanContext)> {
    let workspace = Workspace::load(root).context("failed to load config")?;
    let name = workspace.resolve_plan(&OsFileSystem, name)?;
    let plan = workspace
        .load_plan(&OsFileSystem, &name)
        .with_context(|| format!("failed to load plan '{name}'"))?;
    Ok((workspace, plan))
}

/// Everything the rule engine needs for one plan, resolved once per run.
pub struct PlanSession {
    pub workspace: Workspace,
    pub plan: PlanContext,
    pub git: GitCli,
    pub base: BaseView,
    links: Option<HttpUrlChecker>,
}

impl PlanSession {
    pub fn open(root: &Path, name: Option<&str>, offline: bool) -> anyhow::Result<Self> {
        let (workspace, plan) = open_plan(root, name)?;
        let git = GitCli::open(root)?;
        let base = BaseView::resolve(&git, &workspace.config, &plan)
            .context("failed to resolve the merge-base")?;
        let links = (!offline && workspace.config.links.enabled).then(|| {
            HttpUrlChecker::new(Duration::from_secs(workspace.config.links.timeout_seconds))
        });
        debug!(
            plan = %plan.name,
            base = %base.resolved.base,
            links = links.is_some(),
            "plan session opened"
        );
        Ok(Self {
            workspace,
            plan,
            git,
            base,
            links,
        })
    }

    pub fn eval(&self) -> EvalContext<'_> {
        EvalContext {
            plan: &self.plan,
            config: &self.workspace.config,
            fs: &OsFileSystem,
            templates: &EmbeddedTemplates,
            git: &self.git,
            base: &self.base,
            links: self.links.as_ref().map(|l| l as &dyn UrlChecker),
        }
    }
}
