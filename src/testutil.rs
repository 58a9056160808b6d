//! Scratch directories for tests that need real files.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A `tempfile` directory with helpers for laying out project files; removed on drop.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new(label: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("exe-builder-{label}-"))
            .tempdir()
            .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a file (and its parents) with the given contents.
    pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.path().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_is_removed_on_drop() {
        let scratch = Scratch::new("drop");
        let file = scratch.file("a/b.py", "x = 1\n");
        let root = scratch.path().to_path_buf();
        assert!(file.is_file());
        drop(scratch);
        assert!(!root.exists());
    }
}
