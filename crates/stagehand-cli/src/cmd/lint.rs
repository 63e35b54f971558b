use crate::cmd::PlanSession;
use crate::output::{print_json, print_violations};
use anyhow::Context;
use stagehand_core::lint::{Linter, Scope};
use std::path::Path;

pub fn run(root: &Path, plan: Option<&str>, offline: bool, json: bool) -> anyhow::Result<()> {
    let session = PlanSession::open(root, plan, offline)?;
    let violations = Linter::default()
        .run(&session.eval(), Scope::Lint)
        .context("lint aborted")?;
    let name = &session.plan.name;

    if json {
        print_json(&serde_json::json!({
            "plan": name,
            "base": session.base.resolved.base.to_string(),
            "violations": violations,
        }))?;
    } else if violations.is_empty() {
        println!("{name}: clean");
    } else {
        println!("{name}: {} violation(s)", violations.len());
        print_violations(&violations);
    }

    if !violations.is_empty() {
        anyhow::bail!("plan '{name}' failed lint");
    }
    Ok(())
}
