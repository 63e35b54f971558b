use anyhow::Context;
use stagehand_core::{
    config::Config, fs::OsFileSystem, io, paths, plan::Workspace, templates::EmbeddedTemplates,
};
use std::path::Path;

pub fn run(root: &Path, plan: Option<&str>) -> anyhow::Result<()> {
    println!("Initializing stagehand in: {}", root.display());

    let dir = paths::stagehand_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    let workspace = Workspace::load(root).context("failed to load config")?;
    let plans_root = workspace.plans_root();
    io::ensure_dir(&plans_root)
        .with_context(|| format!("failed to create {}", plans_root.display()))?;
    println!("  plans:   {}/", workspace.config.plans_dir);

    if let Some(name) = plan {
        let ctx = workspace.create_plan(&OsFileSystem, &EmbeddedTemplates, name)?;
        println!("  created: plan '{}'", ctx.name);
        println!("\nFill in meta/goal.md, then run: stagehand next {}", ctx.name);
    }
    Ok(())
}
