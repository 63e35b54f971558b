use crate::error::Result;
use crate::git::phase_from_branch;
use crate::lint::{EvalContext, LintRule};
use crate::links::{dead_links, extract_links};
use crate::paths;
use crate::templates::is_unedited;
use crate::types::{self, Violation};
use std::path::PathBuf;

/// Most lines the checklist may change between the merge-base and the index:
/// one checkbox toggle.
pub const MAX_MODIFIED_LINES: usize = 2;

// ---------------------------------------------------------------------------
// Helper macro for concise rule definitions
// ---------------------------------------------------------------------------

macro_rules! rule {
    (
        id: $id:expr,
        check: $check:expr
        $(, advance_only: $adv:expr)?
        $(, gating: $gate:expr)?
    ) => {
        LintRule {
            id: $id,
            check: $check,
            advance_only: {
                #[allow(unused_assignments, unused_mut)]
                let mut v = false;
                $(v = $adv;)?
                v
            },
            gating: {
                #[allow(unused_assignments, unused_mut)]
                let mut v = false;
                $(v = $gate;)?
                v
            },
        }
    };
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Phase rows exist and phase details are done: the plan is being built.
fn in_implementation(ctx: &EvalContext) -> bool {
    ctx.plan.state.has_phase_details && !ctx.plan.state.phases.is_empty()
}

/// Documents that must exist and be filled in, given the current flags.
/// Each entry is (document path, template name).
fn flagged_documents(ctx: &EvalContext) -> Vec<(PathBuf, &'static str)> {
    let state = &ctx.plan.state;
    let mut docs = Vec::new();
    let meta = [
        (state.is_initialized, paths::GOAL_MD),
        (state.has_references, paths::REFERENCES_MD),
        (state.has_system_analysis, paths::SYSTEM_ANALYSIS_MD),
        (state.has_key_decisions, paths::KEY_DECISIONS_MD),
        (state.has_phase_analysis, paths::PHASE_ANALYSIS_MD),
    ];
    for (flagged, name) in meta {
        if flagged {
            docs.push((ctx.plan.meta_doc(name), name));
        }
    }
    if state.has_phase_details {
        for phase in &state.phases {
            docs.push((
                ctx.plan.phase_details_path(phase.phase_number),
                types::PHASE_DETAILS_TEMPLATE,
            ));
        }
    }
    docs
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn stage_boundaries(ctx: &EvalContext) -> Result<Vec<Violation>> {
    let now = &ctx.plan.state;
    let pairs = [
        (types::KEY_DECISIONS_ID, types::PHASE_ANALYSIS_ID),
        (types::PHASE_ANALYSIS_ID, types::PHASE_DETAILS_ID),
    ];
    Ok(pairs
        .iter()
        .filter(|(a, b)| ctx.base.set_on_branch(now, a) && ctx.base.set_on_branch(now, b))
        .map(|(a, b)| {
            Violation::new(
                "stage-boundary",
                format!("[{a}] and [{b}] were both completed on this branch; split them across separate branches"),
            )
        })
        .collect())
}

fn single_change(ctx: &EvalContext) -> Result<Vec<Violation>> {
    let path = &ctx.base.checklist_path;
    let entries = ctx
        .git
        .changed_files()?
        .iter()
        .filter(|c| &c.path == path)
        .count();
    if entries > 1 {
        return Ok(vec![Violation::new(
            "single-change",
            format!("{path} has {entries} pending changes (staged and unstaged); commit or reset one before continuing"),
        )]);
    }
    Ok(Vec::new())
}

fn in_order(ctx: &EvalContext) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();
    let mut first_open: Option<&str> = None;
    for item in ctx.plan.items.iter().filter(|i| i.phase_number.is_none()) {
        match (first_open, item.is_checked) {
            (None, false) => first_open = Some(&item.identifier),
            (Some(open), true) => violations.push(Violation::new(
                "in-order",
                format!("[{}] is checked but the earlier [{open}] is not", item.identifier),
            )),
            _ => {}
        }
    }
    Ok(violations)
}

fn unedited_documents(ctx: &EvalContext) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();
    for (path, template_name) in flagged_documents(ctx) {
        let shown = ctx.plan.display_path(&path);
        if !ctx.fs.exists(&path) {
            violations.push(Violation::new("unedited-document", format!("{shown} is missing")));
            continue;
        }
        let content = ctx.fs.read_text(&path)?;
        let template = ctx.templates.read_template(template_name)?;
        if is_unedited(&content, &template) {
            violations.push(Violation::new(
                "unedited-document",
                format!("{shown} not modified from template"),
            ));
        }
    }
    Ok(violations)
}

fn branch_per_phase(ctx: &EvalContext) -> Result<Vec<Violation>> {
    if !in_implementation(ctx) {
        return Ok(Vec::new());
    }
    let Some(next) = ctx.plan.state.next_incomplete_phase() else {
        return Ok(Vec::new());
    };
    let Some(branch) = ctx.git.current_branch()? else {
        return Ok(Vec::new());
    };
    let Some(branch_phase) = phase_from_branch(&branch) else {
        return Ok(Vec::new());
    };
    let n = next.phase_number;
    let message = if branch_phase < n {
        format!("branch '{branch}' belongs to phase {branch_phase}; create a new branch for phase {n}")
    } else if branch_phase > n {
        format!("branch '{branch}' is for phase {branch_phase} but phase {n} is still open")
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![Violation::new("branch-per-phase", message)])
}

fn pr_boundaries(ctx: &EvalContext) -> Result<Vec<Violation>> {
    if !in_implementation(ctx) {
        return Ok(Vec::new());
    }
    let state = &ctx.plan.state;
    let Some(next) = state.next_incomplete_phase() else {
        return Ok(Vec::new());
    };
    Ok(state
        .phases
        .iter()
        .filter(|p| p.is_pull_request_boundary && p.phase_number < next.phase_number)
        .filter(|p| ctx.base.phase_completed_on_branch(state, p.phase_number))
        .map(|p| {
            Violation::new(
                "pr-boundary",
                format!(
                    "phase {} ({}) ends a pull request; merge it before starting phase {}",
                    p.phase_number, p.phase_name, next.phase_number
                ),
            )
        })
        .collect())
}

fn merge_quota(ctx: &EvalContext) -> Result<Vec<Violation>> {
    let path = &ctx.base.checklist_path;
    let head = ctx.git.head_sha()?;
    let committed = ctx
        .git
        .count_modified_lines(path, &ctx.base.resolved.sha, &head)?;
    let staged = ctx.git.count_staged_modified_lines(path)?;
    let total = committed + staged;
    if total > MAX_MODIFIED_LINES {
        return Ok(vec![Violation::new(
            "merge-quota",
            format!(
                "{path} changes {total} lines since {} ({committed} committed, {staged} staged); at most {MAX_MODIFIED_LINES} allowed",
                ctx.base.resolved.base
            ),
        )]);
    }
    Ok(Vec::new())
}

fn reference_links(ctx: &EvalContext) -> Result<Vec<Violation>> {
    let Some(checker) = ctx.links else {
        return Ok(Vec::new());
    };
    if !ctx.config.links.enabled {
        return Ok(Vec::new());
    }
    let was_done = ctx
        .base
        .state
        .as_ref()
        .is_some_and(|s| s.has_references);
    let doc = ctx.plan.meta_doc(paths::REFERENCES_MD);
    if was_done || !ctx.fs.exists(&doc) {
        return Ok(Vec::new());
    }
    let urls = extract_links(&ctx.fs.read_text(&doc)?);
    Ok(dead_links(checker, &urls)
        .into_iter()
        .map(|(url, why)| Violation::new("dead-link", format!("{url} {why}")))
        .collect())
}

// ---------------------------------------------------------------------------
// Default rules (evaluation order)
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<LintRule> {
    vec![
        rule! {
            id: "stage-boundary",
            check: stage_boundaries,
            gating: true
        },
        rule! {
            id: "single-change",
            check: single_change
        },
        rule! {
            id: "in-order",
            check: in_order
        },
        rule! {
            id: "unedited-document",
            check: unedited_documents
        },
        rule! {
            id: "branch-per-phase",
            check: branch_per_phase,
            advance_only: true
        },
        rule! {
            id: "pr-boundary",
            check: pr_boundaries,
            advance_only: true
        },
        rule! {
            id: "merge-quota",
            check: merge_quota
        },
        rule! {
            id: "dead-link",
            check: reference_links
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
