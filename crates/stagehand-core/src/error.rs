use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagehandError {
    #[error("plan not found: {0}")]
    PlanNotFound(String),

    #[error("plan already exists: {0}")]
    PlanExists(String),

    #[error("invalid plan name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidPlanName(String),

    #[error("no plans found: run 'stagehand new <plan>'")]
    NoPlans,

    #[error("a plan name is required")]
    PlanNameRequired,

    #[error("multiple plans exist, name one of: {}", .0.join(", "))]
    AmbiguousPlan(Vec<String>),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("checklist item not found: [{0}]")]
    ChecklistItemNotFound(String),

    #[error("checklist anchor not found: [{0}]")]
    ChecklistAnchorNotFound(String),

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("no merge-base found against any base branch candidate ({})", .0.join(", "))]
    BaseBranchUnresolved(Vec<String>),

    #[error("failed to fetch {remote}/{branch}: {stderr}")]
    FetchFailed {
        remote: String,
        branch: String,
        stderr: String,
    },

    #[error("plan state is inconsistent: {0}")]
    InconsistentState(String),

    #[error("{} still matches its template: fill it in before advancing", .0.display())]
    UneditedDocument(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, StagehandError>;
