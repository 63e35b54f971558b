use crate::config::Config;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::git::{resolve_merge_base, Git, ResolvedBase};
use crate::links::UrlChecker;
use crate::plan::{PlanContext, PlanState};
use crate::rules::default_rules;
use crate::templates::TemplateStore;
use crate::types::Violation;
use tracing::debug;

// ---------------------------------------------------------------------------
// BaseView
// ---------------------------------------------------------------------------

/// The plan as it was at the merge-base with the upstream branch. Anything
/// true now but not here was done on the current branch.
#[derive(Debug, Clone)]
pub struct BaseView {
    pub resolved: ResolvedBase,
    /// Repository-relative path of the checklist document.
    pub checklist_path: String,
    /// `None` when the checklist did not exist at the merge-base.
    pub state: Option<PlanState>,
}

impl BaseView {
    pub fn resolve(git: &dyn Git, config: &Config, plan: &PlanContext) -> Result<Self> {
        let resolved = resolve_merge_base(git, &config.base_branches)?;
        let checklist_path = git.repo_relative(&plan.checklist_path)?;
        let state = git
            .show_file(&resolved.sha, &checklist_path)?
            .map(|content| PlanState::parse(&content));
        debug!(
            base = %resolved.base,
            sha = %resolved.sha,
            has_base_state = state.is_some(),
            "base view resolved"
        );
        Ok(Self {
            resolved,
            checklist_path,
            state,
        })
    }

    /// True when `identifier` is checked in `now` but was not at the base.
    pub fn set_on_branch(&self, now: &PlanState, identifier: &str) -> bool {
        let is_set = now.flag(identifier).unwrap_or(false);
        let was_set = self
            .state
            .as_ref()
            .and_then(|s| s.flag(identifier))
            .unwrap_or(false);
        is_set && !was_set
    }

    /// True when phase `number` is complete now but was not at the base.
    pub fn phase_completed_on_branch(&self, now: &PlanState, number: u32) -> bool {
        let is_complete = now.phase(number).is_some_and(|p| p.is_complete);
        let was_complete = self
            .state
            .as_ref()
            .and_then(|s| s.phase(number))
            .is_some_and(|p| p.is_complete);
        is_complete && !was_complete
    }
}

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

pub struct EvalContext<'a> {
    pub plan: &'a PlanContext,
    pub config: &'a Config,
    pub fs: &'a dyn FileSystem,
    pub templates: &'a dyn TemplateStore,
    pub git: &'a dyn Git,
    pub base: &'a BaseView,
    /// `None` disables reference liveness checks (`--offline`).
    pub links: Option<&'a dyn UrlChecker>,
}

// ---------------------------------------------------------------------------
// LintRule
// ---------------------------------------------------------------------------

/// Which command is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Lint,
    Advance,
}

pub struct LintRule {
    pub id: &'static str,
    /// Runs only when advancing the plan.
    pub advance_only: bool,
    /// When this rule reports anything, the remaining rules are skipped.
    pub gating: bool,
    pub check: fn(&EvalContext) -> Result<Vec<Violation>>,
}

impl LintRule {
    fn applies(&self, scope: Scope) -> bool {
        scope == Scope::Advance || !self.advance_only
    }
}

// ---------------------------------------------------------------------------
// Linter
// ---------------------------------------------------------------------------

pub struct Linter {
    rules: Vec<LintRule>,
}

impl Default for Linter {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Linter {
    pub fn new(rules: Vec<LintRule>) -> Self {
        Self { rules }
    }

    /// Run every applicable rule and concatenate their findings in rule order.
    /// Errors are environment failures and abort the run.
    pub fn run(&self, ctx: &EvalContext, scope: Scope) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for rule in self.rules.iter().filter(|r| r.applies(scope)) {
            let found = (rule.check)(ctx)?;
            debug!(rule = rule.id, violations = found.len(), "rule evaluated");
            if rule.gating && !found.is_empty() {
                return Ok(found);
            }
            violations.extend(found);
        }
        Ok(violations)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseBranch;
    use crate::fs::OsFileSystem;
    use crate::templates::EmbeddedTemplates;
    use crate::testing::{FakeGit, BASE_SHA};
    use std::path::Path;

    fn plan(checklist: &str) -> PlanContext {
        PlanContext::new("p", Path::new("/repo/plans/p"), checklist.to_string(), None)
    }

    fn view(base: Option<&str>) -> BaseView {
        BaseView {
            resolved: ResolvedBase {
                base: BaseBranch::local("main"),
                sha: BASE_SHA.to_string(),
            },
            checklist_path: "plans/p/state.md".to_string(),
            state: base.map(PlanState::parse),
        }
    }

    fn always(_: &EvalContext) -> Result<Vec<Violation>> {
        Ok(vec![Violation::new("always", "fires")])
    }

    fn advance_rule(_: &EvalContext) -> Result<Vec<Violation>> {
        Ok(vec![Violation::new("advance", "fires")])
    }

    fn gate(ctx: &EvalContext) -> Result<Vec<Violation>> {
        Ok(if ctx.plan.state.has_references {
            vec![Violation::new("gate", "closed")]
        } else {
            Vec::new()
        })
    }

    fn linter() -> Linter {
        Linter::new(vec![
            LintRule {
                id: "gate",
                advance_only: false,
                gating: true,
                check: gate,
            },
            LintRule {
                id: "always",
                advance_only: false,
                gating: false,
                check: always,
            },
            LintRule {
                id: "advance",
                advance_only: true,
                gating: false,
                check: advance_rule,
            },
        ])
    }

    fn run(checklist: &str, scope: Scope) -> Vec<Violation> {
        let plan = plan(checklist);
        let config = Config::default();
        let git = FakeGit::new(Path::new("/repo"), "main");
        let base = view(None);
        let ctx = EvalContext {
            plan: &plan,
            config: &config,
            fs: &OsFileSystem,
            templates: &EmbeddedTemplates,
            git: &git,
            base: &base,
            links: None,
        };
        linter().run(&ctx, scope).unwrap()
    }

    #[test]
    fn scopes_select_rules() {
        let open = "- [x] [state] s\n- [ ] [references] r\n";
        let lint: Vec<_> = run(open, Scope::Lint).iter().map(|v| v.rule).collect();
        assert_eq!(lint, vec!["always"]);
        let advance: Vec<_> = run(open, Scope::Advance).iter().map(|v| v.rule).collect();
        assert_eq!(advance, vec!["always", "advance"]);
    }

    #[test]
    fn gating_rule_short_circuits() {
        let closed = "- [x] [state] s\n- [x] [references] r\n";
        let rules: Vec<_> = run(closed, Scope::Advance).iter().map(|v| v.rule).collect();
        assert_eq!(rules, vec!["gate"]);
    }

    #[test]
    fn branch_delta_against_base() {
        let now = PlanState::parse("- [x] [key_decisions] k\n- [x] [phase_analysis] p\n- [x] [phase_1] a\n");
        let base = view(Some("- [x] [key_decisions] k\n- [ ] [phase_analysis] p\n"));
        assert!(!base.set_on_branch(&now, "key_decisions"));
        assert!(base.set_on_branch(&now, "phase_analysis"));
        assert!(base.phase_completed_on_branch(&now, 1));

        let fresh = view(None);
        assert!(fresh.set_on_branch(&now, "key_decisions"));
        assert!(!fresh.set_on_branch(&now, "phase_details"));
    }

    #[test]
    fn resolve_reads_checklist_at_merge_base() {
        let git = FakeGit::new(Path::new("/repo"), "phase-1")
            .with_base_file("plans/p/state.md", "- [x] [state] s\n- [x] [references] r\n");
        let config = Config::default();
        let view = BaseView::resolve(&git, &config, &plan("- [x] [state] s\n")).unwrap();
        assert_eq!(view.resolved.base, BaseBranch::local("main"));
        assert_eq!(view.checklist_path, "plans/p/state.md");
        assert!(view.state.unwrap().has_references);
    }
}
