use crate::cmd::PlanSession;
use crate::output::{print_json, print_violations};
use anyhow::Context;
use stagehand_core::advance::{advance, Outcome};
use stagehand_core::git::Git;
use stagehand_core::lint::Linter;
use std::path::Path;

pub fn run(
    root: &Path,
    plan: Option<&str>,
    offline: bool,
    stage: bool,
    json: bool,
) -> anyhow::Result<()> {
    let session = PlanSession::open(root, plan, offline)?;
    let name = &session.plan.name;
    let outcome = advance(&session.eval(), &Linter::default())
        .with_context(|| format!("could not advance plan '{name}'"))?;

    if let Outcome::Applied { written, .. } = &outcome {
        if stage {
            let rel = session.git.repo_relative(written)?;
            session
                .git
                .stage_file(&rel)
                .with_context(|| format!("failed to stage {rel}"))?;
        }
    }

    if json {
        print_json(&outcome)?;
    } else {
        match &outcome {
            Outcome::Blocked { violations } => {
                println!("{name}: blocked by {} violation(s)", violations.len());
                print_violations(violations);
            }
            Outcome::Applied { step, written } => {
                println!("{name}: {step}");
                println!("  wrote: {}", session.plan.display_path(written));
                if stage {
                    println!("  staged");
                }
            }
            Outcome::Finished => println!("{name}: every phase is complete"),
        }
    }

    if matches!(outcome, Outcome::Blocked { .. }) {
        anyhow::bail!("plan '{name}' failed lint; nothing was changed");
    }
    Ok(())
}
