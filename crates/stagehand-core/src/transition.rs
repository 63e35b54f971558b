//! Stage handlers: pick the single next action for a plan and carry it out.

use crate::checklist;
use crate::error::{Result, StagehandError};
use crate::fs::FileSystem;
use crate::paths;
use crate::phase_analysis::{self, PhaseInfo};
use crate::plan::PlanContext;
use crate::templates::{is_unedited, TemplateStore};
use crate::types::{self, Stage};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Copy a stage template into place for the author to fill in.
    ScaffoldDocument {
        stage: Stage,
        path: PathBuf,
        template: &'static str,
    },
    CompleteStage {
        stage: Stage,
        identifier: &'static str,
    },
    /// Add one checklist row per phase declared in the phase analysis.
    SeedPhases { phases: Vec<PhaseInfo> },
    ScaffoldPhaseDetails { phase: u32, path: PathBuf },
    CompletePhase { phase: u32 },
    Finished,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ScaffoldDocument { stage, path, .. } => {
                write!(f, "scaffold {} document at {}", stage, path.display())
            }
            Step::CompleteStage { identifier, .. } => write!(f, "check [{identifier}]"),
            Step::SeedPhases { phases } => write!(f, "add {} phase rows", phases.len()),
            Step::ScaffoldPhaseDetails { phase, path } => {
                write!(f, "scaffold phase {phase} details at {}", path.display())
            }
            Step::CompletePhase { phase } => write!(f, "check [phase_{phase}]"),
            Step::Finished => f.write_str("nothing left to do"),
        }
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Decide the next step from the active stage. Reads only.
pub fn plan_step(
    ctx: &PlanContext,
    fs: &dyn FileSystem,
    templates: &dyn TemplateStore,
) -> Result<Step> {
    let state = &ctx.state;
    if !state.is_initialized {
        return Err(StagehandError::InconsistentState(format!(
            "{} has no checked [{}] row",
            ctx.checklist_path.display(),
            types::STATE_ID
        )));
    }
    if state.has_phase_details && state.phases.is_empty() {
        return Err(StagehandError::InconsistentState(format!(
            "[{}] is checked but the checklist has no phase rows",
            types::PHASE_DETAILS_ID
        )));
    }

    match state.active_stage() {
        Stage::PhaseDetails => phase_details_step(ctx, fs, templates),
        Stage::Implementation => Ok(implementation_step(ctx)),
        stage => document_step(ctx, fs, templates, stage),
    }
}

fn document_step(
    ctx: &PlanContext,
    fs: &dyn FileSystem,
    templates: &dyn TemplateStore,
    stage: Stage,
) -> Result<Step> {
    let (Some(document), Some(identifier)) = (stage.document(), stage.identifier()) else {
        return Err(StagehandError::InconsistentState(format!(
            "stage {stage} has no document"
        )));
    };
    let path = ctx.meta_doc(document);
    if !fs.exists(&path) {
        return Ok(Step::ScaffoldDocument {
            stage,
            path,
            template: document,
        });
    }
    ensure_edited(fs, templates, &path, document)?;
    Ok(Step::CompleteStage { stage, identifier })
}

fn phase_details_step(
    ctx: &PlanContext,
    fs: &dyn FileSystem,
    templates: &dyn TemplateStore,
) -> Result<Step> {
    if ctx.state.phases.is_empty() {
        let analysis_path = ctx.meta_doc(paths::PHASE_ANALYSIS_MD);
        if !fs.exists(&analysis_path) {
            return Err(StagehandError::InconsistentState(format!(
                "{} is missing",
                analysis_path.display()
            )));
        }
        let phases = phase_analysis::parse(&fs.read_text(&analysis_path)?);
        if phases.is_empty() {
            return Err(StagehandError::InconsistentState(format!(
                "{} declares no phases",
                analysis_path.display()
            )));
        }
        return Ok(Step::SeedPhases { phases });
    }

    let existing = fs.list_files(&ctx.plan_dir, "phase-*-details.md")?;
    let mut numbers: Vec<u32> = ctx.state.phases.iter().map(|p| p.phase_number).collect();
    numbers.sort_unstable();
    if let Some(&phase) = numbers
        .iter()
        .find(|n| !existing.contains(&paths::phase_details_filename(**n)))
    {
        return Ok(Step::ScaffoldPhaseDetails {
            phase,
            path: ctx.phase_details_path(phase),
        });
    }

    for phase in numbers {
        ensure_edited(
            fs,
            templates,
            &ctx.phase_details_path(phase),
            types::PHASE_DETAILS_TEMPLATE,
        )?;
    }
    Ok(Step::CompleteStage {
        stage: Stage::PhaseDetails,
        identifier: types::PHASE_DETAILS_ID,
    })
}

fn implementation_step(ctx: &PlanContext) -> Step {
    if ctx.state.is_finished() {
        return Step::Finished;
    }
    match ctx.state.next_incomplete_phase() {
        Some(phase) => Step::CompletePhase {
            phase: phase.phase_number,
        },
        None => Step::Finished,
    }
}

fn ensure_edited(
    fs: &dyn FileSystem,
    templates: &dyn TemplateStore,
    path: &std::path::Path,
    template: &str,
) -> Result<()> {
    let content = fs.read_text(path)?;
    if is_unedited(&content, &templates.read_template(template)?) {
        return Err(StagehandError::UneditedDocument(path.to_path_buf()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Carry out `step` with exactly one write. Returns the path written, if any.
pub fn execute(
    step: &Step,
    ctx: &PlanContext,
    fs: &dyn FileSystem,
    templates: &dyn TemplateStore,
) -> Result<Option<PathBuf>> {
    let (path, content) = match step {
        Step::ScaffoldDocument { path, template, .. } => {
            (path.clone(), templates.read_template(template)?)
        }
        Step::ScaffoldPhaseDetails { path, .. } => (
            path.clone(),
            templates.read_template(types::PHASE_DETAILS_TEMPLATE)?,
        ),
        Step::CompleteStage { identifier, .. } => (
            ctx.checklist_path.clone(),
            checklist::set_checked(&ctx.checklist, identifier, true)?,
        ),
        Step::SeedPhases { phases } => (
            ctx.checklist_path.clone(),
            checklist::insert_phase_rows(&ctx.checklist, types::PHASE_DETAILS_ID, phases)?,
        ),
        Step::CompletePhase { phase } => (
            ctx.checklist_path.clone(),
            checklist::set_checked(&ctx.checklist, &types::phase_identifier(*phase), true)?,
        ),
        Step::Finished => return Ok(None),
    };
    fs.write_text(&path, &content)?;
    info!(plan = %ctx.name, path = %ctx.display_path(&path), "{step}");
    Ok(Some(path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fs::OsFileSystem;
    use crate::plan::Workspace;
    use crate::templates::EmbeddedTemplates;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        ws: Workspace,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let ws = Workspace::new(dir.path(), Config::default());
            ws.create_plan(&OsFileSystem, &EmbeddedTemplates, "p").unwrap();
            Self { _dir: dir, ws }
        }

        fn ctx(&self) -> PlanContext {
            self.ws.load_plan(&OsFileSystem, "p").unwrap()
        }

        fn step(&self) -> Result<Step> {
            plan_step(&self.ctx(), &OsFileSystem, &EmbeddedTemplates)
        }

        /// Plan and execute one step, returning it.
        fn advance(&self) -> Step {
            let ctx = self.ctx();
            let step = plan_step(&ctx, &OsFileSystem, &EmbeddedTemplates).unwrap();
            execute(&step, &ctx, &OsFileSystem, &EmbeddedTemplates).unwrap();
            step
        }

        fn fill(&self, path: &std::path::Path) {
            std::fs::write(path, "# Done\n\nWritten by a human.\n").unwrap();
        }

        fn checklist(&self) -> String {
            std::fs::read_to_string(self.ctx().checklist_path).unwrap()
        }
    }

    const ANALYSIS: &str = "## Phase 1: Schema\nPR Boundary: yes\n\n## Phase 2: API\nPR Boundary: no\n";

    #[test]
    fn missing_document_is_scaffolded_then_completed() {
        let fx = Fixture::new();
        let step = fx.advance();
        let Step::ScaffoldDocument { stage, path, .. } = step else {
            panic!("expected scaffold, got {step:?}");
        };
        assert_eq!(stage, Stage::References);
        assert!(path.ends_with("meta/references.md"));
        assert!(path.exists());

        assert!(matches!(fx.step(), Err(StagehandError::UneditedDocument(_))));

        fx.fill(&path);
        let before = fx.checklist();
        assert_eq!(
            fx.advance(),
            Step::CompleteStage {
                stage: Stage::References,
                identifier: "references"
            }
        );
        let after = fx.checklist();
        assert!(after.contains("- [x] [references]"));
        let changed = before.lines().zip(after.lines()).filter(|(a, b)| a != b).count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn walks_every_stage_to_finished() {
        let fx = Fixture::new();
        for _ in 0..4 {
            let Step::ScaffoldDocument { path, stage, .. } = fx.advance() else {
                panic!("expected scaffold");
            };
            if stage == Stage::PhaseAnalysis {
                std::fs::write(&path, ANALYSIS).unwrap();
            } else {
                fx.fill(&path);
            }
            assert!(matches!(fx.advance(), Step::CompleteStage { .. }));
        }

        let Step::SeedPhases { phases } = fx.advance() else {
            panic!("expected seeding");
        };
        assert_eq!(phases.len(), 2);
        let rows = fx.checklist();
        let details = rows.find("[phase_details]").unwrap();
        assert!(rows.find("- [ ] [phase_1] Schema").unwrap() > details);
        assert!(rows.find("- [ ] [phase_2] API").unwrap() > details);

        for n in [1, 2] {
            let Step::ScaffoldPhaseDetails { phase, path } = fx.advance() else {
                panic!("expected phase details scaffold");
            };
            assert_eq!(phase, n);
            fx.fill(&path);
        }
        assert_eq!(
            fx.advance(),
            Step::CompleteStage {
                stage: Stage::PhaseDetails,
                identifier: "phase_details"
            }
        );

        assert_eq!(fx.advance(), Step::CompletePhase { phase: 1 });
        assert_eq!(fx.advance(), Step::CompletePhase { phase: 2 });
        assert_eq!(fx.advance(), Step::Finished);
        assert!(fx.ctx().state.is_finished());
    }

    #[test]
    fn seeding_without_phases_is_inconsistent() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let checklist = ["references", "system_analysis", "key_decisions", "phase_analysis"]
            .iter()
            .try_fold(ctx.checklist.clone(), |doc, id| checklist::set_checked(&doc, id, true))
            .unwrap();
        std::fs::write(&ctx.checklist_path, checklist).unwrap();
        std::fs::create_dir_all(&ctx.meta_dir).unwrap();
        std::fs::write(ctx.meta_doc("phase-analysis.md"), "# No phase headers here\n").unwrap();
        assert!(matches!(fx.step(), Err(StagehandError::InconsistentState(_))));
    }

    #[test]
    fn uninitialized_checklist_is_inconsistent() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let cleared = checklist::set_checked(&ctx.checklist, "state", false).unwrap();
        std::fs::write(&ctx.checklist_path, cleared).unwrap();
        assert!(matches!(fx.step(), Err(StagehandError::InconsistentState(_))));
    }

    #[test]
    fn finished_writes_nothing() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        assert_eq!(
            execute(&Step::Finished, &ctx, &OsFileSystem, &EmbeddedTemplates).unwrap(),
            None
        );
    }
}
