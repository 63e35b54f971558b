use crate::output::print_json;
use anyhow::Context;
use stagehand_core::{
    fs::OsFileSystem, plan::Workspace, templates::EmbeddedTemplates, StagehandError,
};
use std::path::Path;

pub fn run(root: &Path, plan: Option<&str>, json: bool) -> anyhow::Result<()> {
    let name = plan.ok_or(StagehandError::PlanNameRequired)?;
    let workspace = Workspace::load(root).context("failed to load config")?;
    let ctx = workspace.create_plan(&OsFileSystem, &EmbeddedTemplates, name)?;

    if json {
        print_json(&serde_json::json!({
            "plan": ctx.name,
            "path": ctx.plan_root,
            "stage": ctx.state.active_stage(),
        }))?;
    } else {
        println!("Created plan '{}' in {}", ctx.name, ctx.plan_root.display());
        println!("Fill in meta/goal.md, then run: stagehand next {}", ctx.name);
    }
    Ok(())
}
