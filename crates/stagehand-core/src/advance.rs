use crate::error::Result;
use crate::lint::{EvalContext, Linter, Scope};
use crate::transition::{self, Step};
use crate::types::Violation;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Lint failed; nothing was written.
    Blocked { violations: Vec<Violation> },
    Applied { step: Step, written: PathBuf },
    Finished,
}

/// Lint in advance scope and, only when clean, perform the single next step.
pub fn advance(ctx: &EvalContext, linter: &Linter) -> Result<Outcome> {
    let violations = linter.run(ctx, Scope::Advance)?;
    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "advance blocked");
        return Ok(Outcome::Blocked { violations });
    }

    let step = transition::plan_step(ctx.plan, ctx.fs, ctx.templates)?;
    match transition::execute(&step, ctx.plan, ctx.fs, ctx.templates)? {
        Some(written) => Ok(Outcome::Applied { step, written }),
        None => Ok(Outcome::Finished),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fs::OsFileSystem;
    use crate::lint::BaseView;
    use crate::plan::Workspace;
    use crate::templates::EmbeddedTemplates;
    use crate::testing::FakeGit;
    use crate::types::Stage;
    use tempfile::TempDir;

    fn run(dir: &TempDir, git: &FakeGit) -> Outcome {
        let config = Config::default();
        let ws = Workspace::new(dir.path(), config.clone());
        let plan = ws.load_plan(&OsFileSystem, "p").unwrap();
        let base = BaseView::resolve(git, &config, &plan).unwrap();
        let ctx = EvalContext {
            plan: &plan,
            config: &config,
            fs: &OsFileSystem,
            templates: &EmbeddedTemplates,
            git,
            base: &base,
            links: None,
        };
        advance(&ctx, &Linter::default()).unwrap()
    }

    fn setup() -> (TempDir, FakeGit) {
        let dir = TempDir::new().unwrap();
        Workspace::new(dir.path(), Config::default())
            .create_plan(&OsFileSystem, &EmbeddedTemplates, "p")
            .unwrap();
        let git = FakeGit::new(dir.path(), "main");
        (dir, git)
    }

    #[test]
    fn blocked_run_writes_nothing() {
        let (dir, git) = setup();
        let checklist = dir.path().join("plans/p/state.md");
        let before = std::fs::read_to_string(&checklist).unwrap();

        match run(&dir, &git) {
            Outcome::Blocked { violations } => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].message.contains("goal.md not modified"));
            }
            other => panic!("expected block, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&checklist).unwrap(), before);
        assert!(!dir.path().join("plans/p/meta/references.md").exists());
    }

    #[test]
    fn clean_run_applies_one_step() {
        let (dir, git) = setup();
        std::fs::write(dir.path().join("plans/p/meta/goal.md"), "# Goal\n\nShip it.\n").unwrap();

        match run(&dir, &git) {
            Outcome::Applied { step, written } => {
                assert!(matches!(
                    step,
                    Step::ScaffoldDocument {
                        stage: Stage::References,
                        ..
                    }
                ));
                assert_eq!(written, dir.path().join("plans/p/meta/references.md"));
            }
            other => panic!("expected a step, got {other:?}"),
        }
    }
}
