//! Filesystem collaborator.
//!
//! Everything above this module reads and writes plan documents through
//! [`FileSystem`] so the workflow never depends on a concrete disk layout.

use crate::error::Result;
use crate::io;
use std::path::Path;

pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn read_text(&self, path: &Path) -> Result<String>;
    fn write_text(&self, path: &Path, contents: &str) -> Result<()>;
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;
    /// Names of the immediate subdirectories of `path`, sorted.
    fn list_directories(&self, path: &Path) -> Result<Vec<String>>;
    /// Names of files directly in `path` whose name matches the glob `pattern`, sorted.
    fn list_files(&self, path: &Path, pattern: &str) -> Result<Vec<String>>;
}

/// [`FileSystem`] backed by the real disk. Writes are atomic.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write_text(&self, path: &Path, contents: &str) -> Result<()> {
        io::atomic_write(path, contents.as_bytes())
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let data = std::fs::read(src)?;
        io::atomic_write(dst, &data)
    }

    fn list_directories(&self, path: &Path) -> Result<Vec<String>> {
        if !path.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_files(&self, path: &Path, pattern: &str) -> Result<Vec<String>> {
        if !path.is_dir() {
            return Ok(Vec::new());
        }
        let matcher = glob::Pattern::new(pattern).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("bad file pattern '{pattern}': {e}"),
            )
        })?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if matcher.matches(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let fs = OsFileSystem;
        let path = dir.path().join("meta/goal.md");
        fs.write_text(&path, "# Goal\n").unwrap();
        assert!(fs.exists(&path));
        assert_eq!(fs.read_text(&path).unwrap(), "# Goal\n");
    }

    #[test]
    fn copy_creates_parents() {
        let dir = TempDir::new().unwrap();
        let fs = OsFileSystem;
        let src = dir.path().join("a.md");
        std::fs::write(&src, "body").unwrap();
        let dst = dir.path().join("deep/nested/b.md");
        fs.copy(&src, &dst).unwrap();
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "body");
    }

    #[test]
    fn listings_are_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let fs = OsFileSystem;
        std::fs::create_dir_all(dir.path().join("beta")).unwrap();
        std::fs::create_dir_all(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("phase-2-details.md"), "").unwrap();
        std::fs::write(dir.path().join("phase-1-details.md"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(fs.list_directories(dir.path()).unwrap(), vec!["alpha", "beta"]);
        assert_eq!(
            fs.list_files(dir.path(), "phase-*-details.md").unwrap(),
            vec!["phase-1-details.md", "phase-2-details.md"]
        );
    }

    #[test]
    fn listing_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let fs = OsFileSystem;
        assert!(fs.list_directories(&dir.path().join("nope")).unwrap().is_empty());
        assert!(fs.list_files(&dir.path().join("nope"), "*").unwrap().is_empty());
    }
}
