use crate::cmd::open_plan;
use anyhow::Context;
use stagehand_core::git::{Git, GitCli};
use std::path::Path;

pub fn run(root: &Path, plan: Option<&str>) -> anyhow::Result<()> {
    let (_, ctx) = open_plan(root, plan)?;
    let git = GitCli::open(root)?;
    let rel = git.repo_relative(&ctx.checklist_path)?;
    git.reset_file(&rel)
        .with_context(|| format!("failed to reset {rel}"))?;
    println!("{}: restored {rel} to HEAD", ctx.name);
    Ok(())
}
