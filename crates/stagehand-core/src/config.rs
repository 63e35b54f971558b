use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BaseBranch
// ---------------------------------------------------------------------------

/// A candidate upstream ref the current branch is expected to fork from.
///
/// Candidates with a `remote` can be fetched when they are missing locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseBranch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    pub branch: String,
}

impl BaseBranch {
    pub fn remote(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote: Some(remote.into()),
            branch: branch.into(),
        }
    }

    pub fn local(branch: impl Into<String>) -> Self {
        Self {
            remote: None,
            branch: branch.into(),
        }
    }

    /// The ref name passed to git, e.g. `origin/main` or `main`.
    pub fn ref_name(&self) -> String {
        match &self.remote {
            Some(remote) => format!("{remote}/{}", self.branch),
            None => self.branch.clone(),
        }
    }
}

impl fmt::Display for BaseBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ref_name())
    }
}

fn default_base_branches() -> Vec<BaseBranch> {
    vec![
        BaseBranch::remote("origin", "main"),
        BaseBranch::remote("origin", "master"),
        BaseBranch::local("main"),
        BaseBranch::local("master"),
    ]
}

// ---------------------------------------------------------------------------
// LinkConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_links_enabled")]
    pub enabled: bool,
    #[serde(default = "default_link_timeout")]
    pub timeout_seconds: u64,
}

fn default_links_enabled() -> bool {
    true
}

fn default_link_timeout() -> u64 {
    10
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            enabled: default_links_enabled(),
            timeout_seconds: default_link_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_plans_dir")]
    pub plans_dir: String,
    #[serde(default = "default_base_branches")]
    pub base_branches: Vec<BaseBranch>,
    #[serde(default)]
    pub links: LinkConfig,
}

fn default_version() -> u32 {
    1
}

fn default_plans_dir() -> String {
    paths::DEFAULT_PLANS_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            plans_dir: default_plans_dir(),
            base_branches: default_base_branches(),
            links: LinkConfig::default(),
        }
    }
}

impl Config {
    pub fn plans_root(&self, root: &Path) -> PathBuf {
        root.join(&self.plans_dir)
    }

    /// Load `.stagehand/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.base_branches.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "base_branches is empty: merge-base discovery cannot succeed".to_string(),
            });
        }

        for base in &self.base_branches {
            if base.branch.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "base_branches contains an entry with an empty branch".to_string(),
                });
            }
        }

        if self.links.enabled && self.links.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "links.timeout_seconds is 0: every reference link will time out"
                    .to_string(),
            });
        }

        if Path::new(&self.plans_dir).is_absolute() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "plans_dir '{}' is absolute; plans outside the repository are not versioned",
                    self.plans_dir
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
