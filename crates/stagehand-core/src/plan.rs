use crate::checklist::{self, StateChecklistItem};
use crate::config::Config;
use crate::error::{Result, StagehandError};
use crate::fs::FileSystem;
use crate::paths;
use crate::phase_analysis::{self, PhaseInfo};
use crate::templates::TemplateStore;
use crate::types::{self, Stage};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// PlanState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseState {
    pub phase_number: u32,
    pub phase_name: String,
    pub is_complete: bool,
    pub is_pull_request_boundary: bool,
}

/// Progress derived from the checklist document. Rebuilt on every invocation;
/// the document on disk is the only persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanState {
    pub is_initialized: bool,
    pub has_references: bool,
    pub has_system_analysis: bool,
    pub has_key_decisions: bool,
    pub has_phase_analysis: bool,
    pub has_phase_details: bool,
    pub phases: Vec<PhaseState>,
}

impl PlanState {
    /// Fold checklist rows into flags and phases. Unknown identifiers are ignored.
    pub fn from_items(items: &[StateChecklistItem]) -> Self {
        let mut state = PlanState::default();
        for item in items {
            if let Some(number) = item.phase_number {
                state.phases.push(PhaseState {
                    phase_number: number,
                    phase_name: item.description.clone(),
                    is_complete: item.is_checked,
                    is_pull_request_boundary: false,
                });
                continue;
            }
            match item.identifier.as_str() {
                types::STATE_ID => state.is_initialized = item.is_checked,
                types::REFERENCES_ID => state.has_references = item.is_checked,
                types::SYSTEM_ANALYSIS_ID => state.has_system_analysis = item.is_checked,
                types::KEY_DECISIONS_ID => state.has_key_decisions = item.is_checked,
                types::PHASE_ANALYSIS_ID => state.has_phase_analysis = item.is_checked,
                types::PHASE_DETAILS_ID => state.has_phase_details = item.is_checked,
                _ => {}
            }
        }
        state
    }

    pub fn parse(checklist: &str) -> Self {
        Self::from_items(&checklist::parse(checklist))
    }

    /// Back-fill PR boundary flags; the checklist itself never records them.
    pub fn apply_phase_info(&mut self, info: &[PhaseInfo]) {
        for phase in &mut self.phases {
            if let Some(i) = info.iter().find(|i| i.number == phase.phase_number) {
                phase.is_pull_request_boundary = i.is_pull_request_boundary;
            }
        }
    }

    /// Value of a non-phase stage flag by checklist identifier.
    pub fn flag(&self, identifier: &str) -> Option<bool> {
        match identifier {
            types::STATE_ID => Some(self.is_initialized),
            types::REFERENCES_ID => Some(self.has_references),
            types::SYSTEM_ANALYSIS_ID => Some(self.has_system_analysis),
            types::KEY_DECISIONS_ID => Some(self.has_key_decisions),
            types::PHASE_ANALYSIS_ID => Some(self.has_phase_analysis),
            types::PHASE_DETAILS_ID => Some(self.has_phase_details),
            _ => None,
        }
    }

    pub fn phase(&self, number: u32) -> Option<&PhaseState> {
        self.phases.iter().find(|p| p.phase_number == number)
    }

    /// Lowest-numbered phase that is not complete.
    pub fn next_incomplete_phase(&self) -> Option<&PhaseState> {
        self.phases
            .iter()
            .filter(|p| !p.is_complete)
            .min_by_key(|p| p.phase_number)
    }

    /// The first stage whose flag is unchecked; implementation once all are set.
    pub fn active_stage(&self) -> Stage {
        Stage::all()
            .iter()
            .copied()
            .find(|s| {
                s.identifier()
                    .and_then(|id| self.flag(id))
                    .is_some_and(|done| !done)
            })
            .unwrap_or(Stage::Implementation)
    }

    pub fn is_finished(&self) -> bool {
        self.has_phase_details
            && !self.phases.is_empty()
            && self.phases.iter().all(|p| p.is_complete)
    }
}

// ---------------------------------------------------------------------------
// PlanContext
// ---------------------------------------------------------------------------

/// Working set for one command invocation on one plan.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub name: String,
    pub state: PlanState,
    pub items: Vec<StateChecklistItem>,
    /// Raw checklist text; rewrites are applied to this, never re-serialized.
    pub checklist: String,
    pub plan_root: PathBuf,
    pub meta_dir: PathBuf,
    pub plan_dir: PathBuf,
    pub checklist_path: PathBuf,
}

impl PlanContext {
    pub fn new(
        name: impl Into<String>,
        plan_root: &Path,
        checklist: String,
        phase_analysis: Option<&str>,
    ) -> Self {
        let items = checklist::parse(&checklist);
        let mut state = PlanState::from_items(&items);
        if let Some(doc) = phase_analysis {
            state.apply_phase_info(&phase_analysis::parse(doc));
        }
        Self {
            name: name.into(),
            state,
            items,
            checklist,
            plan_root: plan_root.to_path_buf(),
            meta_dir: paths::meta_dir(plan_root),
            plan_dir: paths::phase_docs_dir(plan_root),
            checklist_path: paths::checklist_path(plan_root),
        }
    }

    pub fn meta_doc(&self, filename: &str) -> PathBuf {
        self.meta_dir.join(filename)
    }

    pub fn phase_details_path(&self, phase: u32) -> PathBuf {
        self.plan_dir.join(paths::phase_details_filename(phase))
    }

    /// Plan-relative display path, e.g. `meta/goal.md`.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.plan_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// A project root plus its configuration; the home of every plan.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        Ok(Self::new(root, Config::load(root)?))
    }

    pub fn plans_root(&self) -> PathBuf {
        self.config.plans_root(&self.root)
    }

    /// Plan names: directories under the plans root holding a checklist.
    pub fn list_plans(&self, fs: &dyn FileSystem) -> Result<Vec<String>> {
        let plans_root = self.plans_root();
        let mut plans = Vec::new();
        for dir in fs.list_directories(&plans_root)? {
            let plan_root = paths::plan_root(&plans_root, &dir);
            if fs.exists(&paths::checklist_path(&plan_root)) {
                plans.push(dir);
            }
        }
        Ok(plans)
    }

    /// Pick the plan a command operates on. An explicit name wins; otherwise
    /// the single existing plan is used.
    pub fn resolve_plan(&self, fs: &dyn FileSystem, name: Option<&str>) -> Result<String> {
        if let Some(name) = name {
            return Ok(name.to_string());
        }
        let mut plans = self.list_plans(fs)?;
        match plans.len() {
            0 => Err(StagehandError::NoPlans),
            1 => Ok(plans.remove(0)),
            _ => Err(StagehandError::AmbiguousPlan(plans)),
        }
    }

    /// Create a plan: checklist with only `[state]` checked plus `meta/goal.md`.
    pub fn create_plan(
        &self,
        fs: &dyn FileSystem,
        templates: &dyn TemplateStore,
        name: &str,
    ) -> Result<PlanContext> {
        paths::validate_plan_name(name)?;
        let plan_root = paths::plan_root(&self.plans_root(), name);
        if fs.exists(&plan_root) {
            return Err(StagehandError::PlanExists(name.to_string()));
        }

        let checklist = templates
            .read_template(types::CHECKLIST_TEMPLATE)?
            .replace("{{plan_name}}", name);
        let goal = templates.read_template(paths::GOAL_MD)?;

        let ctx = PlanContext::new(name, &plan_root, checklist, None);
        fs.write_text(&ctx.meta_doc(paths::GOAL_MD), &goal)?;
        fs.write_text(&ctx.checklist_path, &ctx.checklist)?;
        tracing::info!(plan = name, root = %plan_root.display(), "plan created");
        Ok(ctx)
    }

    pub fn load_plan(&self, fs: &dyn FileSystem, name: &str) -> Result<PlanContext> {
        let plan_root = paths::plan_root(&self.plans_root(), name);
        let checklist_path = paths::checklist_path(&plan_root);
        if !fs.exists(&checklist_path) {
            return Err(StagehandError::PlanNotFound(name.to_string()));
        }
        let checklist = fs.read_text(&checklist_path)?;
        let analysis_path = paths::meta_dir(&plan_root).join(paths::PHASE_ANALYSIS_MD);
        let analysis = if fs.exists(&analysis_path) {
            Some(fs.read_text(&analysis_path)?)
        } else {
            None
        };
        Ok(PlanContext::new(
            name,
            &plan_root,
            checklist,
            analysis.as_deref(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
