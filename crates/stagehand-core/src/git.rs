//! Version-control access layer.
//!
//! Rules and transitions only see the [`Git`] capability trait. [`GitCli`]
//! implements it by shelling out to `git`; it keeps no state beyond the
//! working directory, so every query reflects the repository as it is now.

use crate::config::BaseBranch;
use crate::error::{Result, StagehandError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeLocation {
    Index,
    WorkTree,
    Untracked,
}

/// One pending change to a path. A file that is both staged and edited again
/// shows up twice: once for the index, once for the worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub location: ChangeLocation,
}

pub trait Git {
    /// `path` as a repository-relative, `/`-separated string.
    fn repo_relative(&self, path: &Path) -> Result<String>;
    fn changed_files(&self) -> Result<Vec<ChangedFile>>;
    /// Common ancestor of HEAD and `base_ref`, `None` if the ref is absent
    /// or shares no history with HEAD.
    fn merge_base(&self, base_ref: &str) -> Result<Option<String>>;
    fn head_sha(&self) -> Result<String>;
    /// Short name of the checked-out branch, `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;
    /// Contents of `path` at commit `sha`, `None` if it did not exist there.
    fn show_file(&self, sha: &str, path: &str) -> Result<Option<String>>;
    fn count_modified_lines(&self, path: &str, old_sha: &str, new_sha: &str) -> Result<usize>;
    fn count_staged_modified_lines(&self, path: &str) -> Result<usize>;
    fn fetch_remote_branch(&self, remote: &str, branch: &str) -> Result<()>;
    fn stage_file(&self, path: &str) -> Result<()>;
    /// Restore `path` to HEAD, or unstage and delete it if HEAD never had it.
    fn reset_file(&self, path: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Line counting
// ---------------------------------------------------------------------------

/// Lines modified in place by a unified diff: deletions counted twice.
///
/// A checkbox toggle is one deletion paired with one addition, so it counts
/// as 2. Pure insertions count as 0. A pure deletion counts as 2 as well,
/// which undercounts it; the quota threshold is calibrated against this.
pub fn modified_lines_in_diff(diff: &str) -> usize {
    let mut in_hunk = false;
    let mut deletions = 0;
    for line in diff.lines() {
        if line.starts_with("diff --git") {
            in_hunk = false;
        } else if line.starts_with("@@") {
            in_hunk = true;
        } else if in_hunk && line.starts_with('-') {
            deletions += 1;
        }
    }
    deletions * 2
}

// ---------------------------------------------------------------------------
// Branch naming
// ---------------------------------------------------------------------------

static PHASE_BRANCH_RE: OnceLock<Regex> = OnceLock::new();

fn phase_branch_re() -> &'static Regex {
    PHASE_BRANCH_RE.get_or_init(|| {
        Regex::new(r"(?:^|/)phase-(\d+)(?:-[A-Za-z0-9][A-Za-z0-9._-]*)?$").unwrap()
    })
}

/// Phase number encoded in a `phase-<N>` or `phase-<N>-<slug>` branch name.
pub fn phase_from_branch(branch: &str) -> Option<u32> {
    phase_branch_re()
        .captures(branch)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ---------------------------------------------------------------------------
// Merge-base discovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBase {
    pub base: BaseBranch,
    pub sha: String,
}

/// Find the merge-base against the first candidate that resolves.
///
/// Candidates are tried in order. When none resolves, each remote candidate is
/// fetched once and retried. A failed fetch aborts immediately.
#[instrument(skip_all)]
pub fn resolve_merge_base(git: &dyn Git, candidates: &[BaseBranch]) -> Result<ResolvedBase> {
    if candidates.is_empty() {
        return Err(StagehandError::InvalidConfig(
            "base_branches must name at least one candidate".to_string(),
        ));
    }
    for base in candidates {
        if let Some(sha) = git.merge_base(&base.ref_name())? {
            debug!(base = %base, %sha, "merge-base resolved");
            return Ok(ResolvedBase {
                base: base.clone(),
                sha,
            });
        }
    }

    for base in candidates {
        let Some(remote) = base.remote.as_deref() else {
            continue;
        };
        warn!(base = %base, "base branch missing locally, fetching");
        git.fetch_remote_branch(remote, &base.branch)?;
        if let Some(sha) = git.merge_base(&base.ref_name())? {
            debug!(base = %base, %sha, "merge-base resolved after fetch");
            return Ok(ResolvedBase {
                base: base.clone(),
                sha,
            });
        }
    }

    Err(StagehandError::BaseBranchUnresolved(
        candidates.iter().map(BaseBranch::ref_name).collect(),
    ))
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// [`Git`] implemented with `git` subprocesses rooted at the repository top level.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Open the repository containing `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(dir)
            .output()?;
        if !output.status.success() {
            return Err(StagehandError::NotARepository(dir.to_path_buf()));
        }
        let top = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        let workdir = top.canonicalize().unwrap_or(top);
        debug!(workdir = %workdir.display(), "opened repository");
        Ok(Self { workdir })
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(args = %args.join(" "), "git");
        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()?)
    }

    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(StagehandError::Git {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_bool(&self, args: &[&str]) -> Result<bool> {
        Ok(self.run(args)?.status.success())
    }
}

fn canonical(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => canonical(parent).join(name),
        _ => path.to_path_buf(),
    }
}

/// One NUL-terminated `status --porcelain=v1 -z` entry. Paths arrive verbatim.
fn parse_status_entry(entry: &str) -> Vec<ChangedFile> {
    if entry.len() < 4 {
        return Vec::new();
    }
    let code = &entry[..2];
    let path = entry[3..].to_string();
    if code == "??" {
        return vec![ChangedFile {
            path,
            location: ChangeLocation::Untracked,
        }];
    }
    let mut entries = Vec::new();
    let mut chars = code.chars();
    if chars.next().is_some_and(|x| x != ' ') {
        entries.push(ChangedFile {
            path: path.clone(),
            location: ChangeLocation::Index,
        });
    }
    if chars.next().is_some_and(|y| y != ' ') {
        entries.push(ChangedFile {
            path,
            location: ChangeLocation::WorkTree,
        });
    }
    entries
}

impl Git for GitCli {
    fn repo_relative(&self, path: &Path) -> Result<String> {
        let abs = canonical(path);
        let rel = abs
            .strip_prefix(&self.workdir)
            .map_err(|_| StagehandError::NotARepository(path.to_path_buf()))?;
        Ok(rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"))
    }

    fn changed_files(&self) -> Result<Vec<ChangedFile>> {
        let out = self.run_checked(&["status", "--porcelain=v1", "-z", "-uall", "--no-renames"])?;
        Ok(out.split('\0').flat_map(parse_status_entry).collect())
    }

    fn merge_base(&self, base_ref: &str) -> Result<Option<String>> {
        let commit = format!("{base_ref}^{{commit}}");
        if !self.run_bool(&["rev-parse", "--verify", "--quiet", &commit])? {
            debug!(base_ref, "ref not present locally");
            return Ok(None);
        }
        let output = self.run(&["merge-base", "HEAD", base_ref])?;
        match output.status.code() {
            Some(0) => Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            )),
            Some(1) => Ok(None),
            _ => Err(StagehandError::Git {
                command: format!("merge-base HEAD {base_ref}"),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    fn head_sha(&self) -> Result<String> {
        Ok(self.run_checked(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let output = self.run(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    fn show_file(&self, sha: &str, path: &str) -> Result<Option<String>> {
        let object = format!("{sha}:{path}");
        if !self.run_bool(&["cat-file", "-e", &object])? {
            return Ok(None);
        }
        Ok(Some(self.run_checked(&["show", &object])?))
    }

    #[instrument(skip(self))]
    fn count_modified_lines(&self, path: &str, old_sha: &str, new_sha: &str) -> Result<usize> {
        let diff = self.run_checked(&[
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--unified=0",
            old_sha,
            new_sha,
            "--",
            path,
        ])?;
        Ok(modified_lines_in_diff(&diff))
    }

    #[instrument(skip(self))]
    fn count_staged_modified_lines(&self, path: &str) -> Result<usize> {
        let diff = self.run_checked(&[
            "diff",
            "--cached",
            "--no-color",
            "--no-ext-diff",
            "--unified=0",
            "--",
            path,
        ])?;
        Ok(modified_lines_in_diff(&diff))
    }

    #[instrument(skip(self))]
    fn fetch_remote_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");
        let output = self.run(&["fetch", "--quiet", remote, &refspec])?;
        if !output.status.success() {
            return Err(StagehandError::FetchFailed {
                remote: remote.to_string(),
                branch: branch.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn stage_file(&self, path: &str) -> Result<()> {
        self.run_checked(&["add", "--", path])?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn reset_file(&self, path: &str) -> Result<()> {
        let in_head = self.run_bool(&["cat-file", "-e", &format!("HEAD:{path}")])?;
        if in_head {
            self.run_checked(&["checkout", "HEAD", "--", path])?;
            return Ok(());
        }
        self.run_checked(&["rm", "--cached", "--quiet", "--force", "--ignore-unmatch", "--", path])?;
        let on_disk = self.workdir.join(path);
        if on_disk.exists() {
            std::fs::remove_file(on_disk)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
