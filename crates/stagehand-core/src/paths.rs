use crate::error::{Result, StagehandError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STAGEHAND_DIR: &str = ".stagehand";
pub const CONFIG_FILE: &str = ".stagehand/config.yaml";
pub const DEFAULT_PLANS_DIR: &str = "plans";

pub const CHECKLIST_FILE: &str = "state.md";
pub const META_DIR: &str = "meta";
pub const PLAN_DIR: &str = "plan";

pub const GOAL_MD: &str = "goal.md";
pub const REFERENCES_MD: &str = "references.md";
pub const SYSTEM_ANALYSIS_MD: &str = "system-analysis.md";
pub const KEY_DECISIONS_MD: &str = "key-decisions.md";
pub const PHASE_ANALYSIS_MD: &str = "phase-analysis.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn stagehand_dir(root: &Path) -> PathBuf {
    root.join(STAGEHAND_DIR)
}

pub fn plan_root(plans_root: &Path, name: &str) -> PathBuf {
    plans_root.join(name)
}

pub fn checklist_path(plan_root: &Path) -> PathBuf {
    plan_root.join(CHECKLIST_FILE)
}

pub fn meta_dir(plan_root: &Path) -> PathBuf {
    plan_root.join(META_DIR)
}

pub fn phase_docs_dir(plan_root: &Path) -> PathBuf {
    plan_root.join(PLAN_DIR)
}

pub fn phase_details_filename(phase: u32) -> String {
    format!("phase-{phase}-details.md")
}

// ---------------------------------------------------------------------------
// Plan name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_plan_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(StagehandError::InvalidPlanName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["auth-login", "a", "blog-search-2", "x1"] {
            validate_plan_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "-leading", "trailing-", "has spaces", "UPPER", "a_b"] {
            assert!(validate_plan_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn plan_layout() {
        let root = plan_root(Path::new("/tmp/proj/plans"), "search");
        assert_eq!(
            checklist_path(&root),
            PathBuf::from("/tmp/proj/plans/search/state.md")
        );
        assert_eq!(meta_dir(&root), PathBuf::from("/tmp/proj/plans/search/meta"));
        assert_eq!(
            phase_docs_dir(&root).join(phase_details_filename(3)),
            PathBuf::from("/tmp/proj/plans/search/plan/phase-3-details.md")
        );
    }
}
