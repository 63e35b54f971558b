use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Checklist identifiers
// ---------------------------------------------------------------------------

pub const STATE_ID: &str = "state";
pub const REFERENCES_ID: &str = "references";
pub const SYSTEM_ANALYSIS_ID: &str = "system_analysis";
pub const KEY_DECISIONS_ID: &str = "key_decisions";
pub const PHASE_ANALYSIS_ID: &str = "phase_analysis";
pub const PHASE_DETAILS_ID: &str = "phase_details";

pub const PHASE_ID_PREFIX: &str = "phase_";

pub fn phase_identifier(phase: u32) -> String {
    format!("{PHASE_ID_PREFIX}{phase}")
}

/// Template name of the per-phase details document.
pub const PHASE_DETAILS_TEMPLATE: &str = "phase-n-details.md";
/// Template name of the checklist document.
pub const CHECKLIST_TEMPLATE: &str = "state.md";

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    References,
    SystemAnalysis,
    KeyDecisions,
    PhaseAnalysis,
    PhaseDetails,
    Implementation,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::References,
            Stage::SystemAnalysis,
            Stage::KeyDecisions,
            Stage::PhaseAnalysis,
            Stage::PhaseDetails,
            Stage::Implementation,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::References => "references",
            Stage::SystemAnalysis => "system-analysis",
            Stage::KeyDecisions => "key-decisions",
            Stage::PhaseAnalysis => "phase-analysis",
            Stage::PhaseDetails => "phase-details",
            Stage::Implementation => "implementation",
        }
    }

    /// Checklist flag completed by this stage. Implementation has one flag per phase.
    pub fn identifier(self) -> Option<&'static str> {
        match self {
            Stage::References => Some(REFERENCES_ID),
            Stage::SystemAnalysis => Some(SYSTEM_ANALYSIS_ID),
            Stage::KeyDecisions => Some(KEY_DECISIONS_ID),
            Stage::PhaseAnalysis => Some(PHASE_ANALYSIS_ID),
            Stage::PhaseDetails => Some(PHASE_DETAILS_ID),
            Stage::Implementation => None,
        }
    }

    /// The single meta document a stage produces, which is also its template name.
    pub fn document(self) -> Option<&'static str> {
        match self {
            Stage::References => Some(paths::REFERENCES_MD),
            Stage::SystemAnalysis => Some(paths::SYSTEM_ANALYSIS_MD),
            Stage::KeyDecisions => Some(paths::KEY_DECISIONS_MD),
            Stage::PhaseAnalysis => Some(paths::PHASE_ANALYSIS_MD),
            Stage::PhaseDetails | Stage::Implementation => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// One lint finding. Violations are values, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}
