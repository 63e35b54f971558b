//! Test doubles for the git and URL collaborators.

use crate::error::{Result, StagehandError};
use crate::git::{ChangedFile, Git};
use crate::links::UrlChecker;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const BASE_SHA: &str = "b45e000000000000000000000000000000000000";
pub const HEAD_SHA: &str = "4ead000000000000000000000000000000000000";

/// In-memory [`Git`]: every answer is preset; fetches are recorded.
#[derive(Debug, Default)]
pub struct FakeGit {
    pub workdir: PathBuf,
    pub changed: Vec<ChangedFile>,
    pub branch: Option<String>,
    /// ref name -> merge-base sha.
    pub merge_bases: RefCell<HashMap<String, String>>,
    /// Refs that appear once `remote/branch` is fetched.
    pub fetchable: HashMap<String, String>,
    /// (sha, repo path) -> contents.
    pub files: HashMap<(String, String), String>,
    pub committed_lines: usize,
    pub staged_lines: usize,
    pub fetched: RefCell<Vec<String>>,
}

impl FakeGit {
    /// A repository at `workdir` on `branch`, forked from `main` at [`BASE_SHA`].
    pub fn new(workdir: &Path, branch: &str) -> Self {
        let fake = Self {
            workdir: workdir.to_path_buf(),
            branch: Some(branch.to_string()),
            ..Self::default()
        };
        fake.merge_bases
            .borrow_mut()
            .insert("main".to_string(), BASE_SHA.to_string());
        fake
    }

    pub fn with_base_file(mut self, path: &str, contents: &str) -> Self {
        self.files
            .insert((BASE_SHA.to_string(), path.to_string()), contents.to_string());
        self
    }
}

impl Git for FakeGit {
    fn repo_relative(&self, path: &Path) -> Result<String> {
        let rel = path
            .strip_prefix(&self.workdir)
            .map_err(|_| StagehandError::NotARepository(path.to_path_buf()))?;
        Ok(rel.to_string_lossy().replace('\\', "/"))
    }

    fn changed_files(&self) -> Result<Vec<ChangedFile>> {
        Ok(self.changed.clone())
    }

    fn merge_base(&self, base_ref: &str) -> Result<Option<String>> {
        Ok(self.merge_bases.borrow().get(base_ref).cloned())
    }

    fn head_sha(&self) -> Result<String> {
        Ok(HEAD_SHA.to_string())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn show_file(&self, sha: &str, path: &str) -> Result<Option<String>> {
        Ok(self.files.get(&(sha.to_string(), path.to_string())).cloned())
    }

    fn count_modified_lines(&self, _path: &str, _old: &str, _new: &str) -> Result<usize> {
        Ok(self.committed_lines)
    }

    fn count_staged_modified_lines(&self, _path: &str) -> Result<usize> {
        Ok(self.staged_lines)
    }

    fn fetch_remote_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let name = format!("{remote}/{branch}");
        self.fetched.borrow_mut().push(name.clone());
        match self.fetchable.get(&name) {
            Some(sha) => {
                self.merge_bases.borrow_mut().insert(name, sha.clone());
                Ok(())
            }
            None => Err(StagehandError::FetchFailed {
                remote: remote.to_string(),
                branch: branch.to_string(),
                stderr: "couldn't find remote ref".to_string(),
            }),
        }
    }

    fn stage_file(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn reset_file(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}

/// [`UrlChecker`] answering from a fixed table; unknown urls are alive.
#[derive(Debug, Default)]
pub struct FakeUrls {
    pub answers: HashMap<String, std::result::Result<u16, String>>,
    pub asked: RefCell<Vec<String>>,
}

impl FakeUrls {
    pub fn with(mut self, url: &str, answer: std::result::Result<u16, String>) -> Self {
        self.answers.insert(url.to_string(), answer);
        self
    }
}

impl UrlChecker for FakeUrls {
    fn head_request(&self, url: &str) -> std::result::Result<u16, String> {
        self.asked.borrow_mut().push(url.to_string());
        self.answers.get(url).cloned().unwrap_or(Ok(200))
    }
}
