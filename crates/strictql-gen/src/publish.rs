//! Atomic replacement of the output directory.
//!
//! New content is staged in a temporary sibling of the target. On commit the
//! target is renamed aside, the staging directory renamed into place and the
//! old tree removed, so readers see either the old or the new tree. Dropping
//! an uncommitted [`ScopedReplace`] removes the staging directory and leaves
//! the target untouched.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::{GenerateError, Result};
use crate::manifest::Manifest;

/// A staged replacement for a directory.
#[derive(Debug)]
pub struct ScopedReplace {
    target: PathBuf,
    staging: TempDir,
}

impl ScopedReplace {
    /// Creates an empty staging directory next to `target`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the parent directory cannot be created or
    /// written to.
    pub fn new(target: &Path) -> Result<Self> {
        let parent = parent_of(target);
        fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(&hidden_sibling_name(target, "staging"))
            .tempdir_in(parent)?;
        debug!(staging = %staging.path().display(), "Created staging directory");
        Ok(Self {
            target: target.to_path_buf(),
            staging,
        })
    }

    /// The staging directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    /// Writes a file into the staging directory, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written or synced.
    pub fn write(&self, relative: &Path, contents: &[u8]) -> Result<()> {
        let path = self.staging.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(())
    }

    /// Checksums the staged tree and writes its manifest.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error.
    pub fn write_manifest(&self) -> Result<Manifest> {
        let manifest = Manifest::compute(self.staging.path())?;
        manifest.save(self.staging.path())?;
        Ok(manifest)
    }

    /// Moves the staged tree into place.
    ///
    /// # Errors
    ///
    /// Returns an IO error if a rename fails. When the staged tree cannot be
    /// moved into place the previous target is restored.
    pub fn commit(self) -> Result<()> {
        let parent = parent_of(&self.target);
        let old = self
            .target
            .exists()
            .then(|| parent.join(hidden_sibling_name(&self.target, "old")));

        if let Some(old) = &old {
            if old.exists() {
                fs::remove_dir_all(old)?;
            }
            fs::rename(&self.target, old)?;
        }

        if let Err(err) = fs::rename(self.staging.path(), &self.target) {
            if let Some(old) = &old {
                if let Err(restore) = fs::rename(old, &self.target) {
                    warn!(error = %restore, "Failed to restore previous output directory");
                }
            }
            return Err(GenerateError::Io(err));
        }
        sync_dir(parent);

        if let Some(old) = &old {
            fs::remove_dir_all(old)?;
        }
        info!(path = %self.target.display(), "Published output directory");
        Ok(())
    }
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn hidden_sibling_name(target: &Path, suffix: &str) -> OsString {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or(target.as_os_str()));
    name.push(".");
    name.push(suffix);
    name
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(err) = fs::File::open(dir).and_then(|dir| dir.sync_all()) {
        debug!(error = %err, "Could not sync directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_commit_creates_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("generated");

        let replace = ScopedReplace::new(&target).unwrap();
        replace.write(Path::new("a/b.py"), b"b").unwrap();
        let manifest = replace.write_manifest().unwrap();
        replace.commit().unwrap();

        assert_eq!(fs::read_to_string(target.join("a/b.py")).unwrap(), "b");
        assert_eq!(Manifest::load(&target).unwrap(), Some(manifest));
        assert_eq!(entries(dir.path()), vec!["generated"]);
    }

    #[test]
    fn test_commit_replaces_existing_tree() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("generated");
        fs::create_dir_all(target.join("stale")).unwrap();
        fs::write(target.join("stale/old.py"), "old").unwrap();

        let replace = ScopedReplace::new(&target).unwrap();
        replace.write(Path::new("new.py"), b"new").unwrap();
        replace.commit().unwrap();

        assert_eq!(entries(&target), vec!["new.py"]);
        assert_eq!(entries(dir.path()), vec!["generated"]);
    }

    #[test]
    fn test_drop_without_commit_leaves_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("generated");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.py"), "keep").unwrap();

        {
            let replace = ScopedReplace::new(&target).unwrap();
            replace.write(Path::new("other.py"), b"other").unwrap();
        }

        assert_eq!(entries(&target), vec!["keep.py"]);
        assert_eq!(entries(dir.path()), vec!["generated"]);
    }
}
