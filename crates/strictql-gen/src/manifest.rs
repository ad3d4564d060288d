//! Checksums of generated files, used to detect hand edits between runs.
//!
//! The manifest is stored as `strictql_meta.json` at the output root:
//!
//! ```json
//! {"files_checksums": {"users/fetch_all_users.py": "<sha256 hex>"}}
//! ```
//!
//! It covers every Python module below the root. Other files, such as the
//! bytecode Python leaves in `__pycache__`, are ignored. A run refuses to
//! replace a directory whose modules no longer match its manifest.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{GenerateError, Result};

/// File name of the manifest at the output root.
pub const MANIFEST_FILE: &str = "strictql_meta.json";

/// Relative path → SHA-256 hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files_checksums: BTreeMap<String, String>,
}

/// How two manifests differ, by relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// Present in both with different contents.
    pub changed: Vec<String>,
    /// Expected but absent.
    pub missing: Vec<String>,
    /// Present but not expected.
    pub extra: Vec<String>,
}

impl ManifestDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.missing.is_empty() && self.extra.is_empty()
    }

    /// Every differing path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self
            .changed
            .iter()
            .chain(&self.missing)
            .chain(&self.extra)
            .collect();
        all.into_iter().cloned().collect()
    }
}

/// SHA-256 of `bytes` as lower case hex.
#[must_use]
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Whether `path` is a file the manifest tracks.
#[must_use]
pub fn is_tracked(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "py")
}

/// The manifest key of a relative path: components joined with `/`.
#[must_use]
pub fn manifest_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl Manifest {
    /// Builds a manifest from in-memory file contents.
    pub fn from_contents<'a>(files: impl IntoIterator<Item = (&'a Path, &'a [u8])>) -> Self {
        Self {
            files_checksums: files
                .into_iter()
                .map(|(path, contents)| (manifest_key(path), checksum(contents)))
                .collect(),
        }
    }

    /// Checksums every Python module below `root`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the tree cannot be read.
    pub fn compute(root: &Path) -> Result<Self> {
        let mut files_checksums = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let metadata = fs::metadata(&path)?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !is_tracked(&path) {
                    continue;
                }
                let relative = path.strip_prefix(root).unwrap_or(&path);
                files_checksums.insert(manifest_key(relative), checksum(&fs::read(&path)?));
            }
        }
        Ok(Self { files_checksums })
    }

    /// Loads the manifest stored in `root`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the file exists but cannot be read.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let reader = BufReader::new(fs::File::open(path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Writes the manifest into `root` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the file cannot be written.
    pub fn save(&self, root: &Path) -> Result<()> {
        let file = fs::File::create(root.join(MANIFEST_FILE))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.into_inner().map_err(|err| err.into_error())?.sync_all()?;
        Ok(())
    }

    /// Compares `actual` against this manifest as the expectation.
    #[must_use]
    pub fn diff(&self, actual: &Self) -> ManifestDiff {
        let mut diff = ManifestDiff::default();
        for (path, expected) in &self.files_checksums {
            match actual.files_checksums.get(path) {
                None => diff.missing.push(path.clone()),
                Some(found) if found != expected => diff.changed.push(path.clone()),
                Some(_) => {}
            }
        }
        diff.extra = actual
            .files_checksums
            .keys()
            .filter(|path| !self.files_checksums.contains_key(*path))
            .cloned()
            .collect();
        diff
    }
}

/// Checks that `root` may be replaced: it does not exist yet, or it still
/// matches its stored manifest.
///
/// # Errors
///
/// `MissingManifest` when the directory exists without a manifest, even an
/// empty one, and `ManifestDrift` when its modules differ from the manifest.
pub fn verify_output_dir(root: &Path) -> Result<()> {
    if !root.exists() {
        info!(path = %root.display(), "Output directory does not exist yet");
        return Ok(());
    }

    let Some(stored) = Manifest::load(root)? else {
        return Err(GenerateError::MissingManifest(root.to_path_buf()));
    };

    let diff = stored.diff(&Manifest::compute(root)?);
    if !diff.is_empty() {
        return Err(GenerateError::ManifestDrift {
            path: root.to_path_buf(),
            changed: diff.paths(),
        });
    }
    info!(path = %root.display(), files = stored.files_checksums.len(), "Output directory matches its manifest");
    Ok(())
}
