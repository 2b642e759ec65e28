use std::io::ErrorKind;
use std::path::Path;

use crivo_core::ArtifactConfig;
use serde_json::Value;
use tracing::{debug, warn};

/// Read a text artifact, best effort.
///
/// Invalid UTF-8 sequences are dropped. A missing file or any other I/O
/// error yields an empty string; this function never fails.
///
/// # Examples
///
/// ```
/// use crivo_review::artifacts::read_text;
/// use std::path::Path;
///
/// assert_eq!(read_text(Path::new("/definitely/not/here.txt")), "");
/// ```
pub fn read_text(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => decode_lossy(&bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "artifact not found, treating as empty");
            String::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read artifact");
            String::new()
        }
    }
}

/// Read a JSON artifact, best effort.
///
/// Returns an empty object when the file is missing, empty, or not valid JSON.
pub fn read_json(path: &Path) -> Value {
    let content = read_text(path);
    if content.trim().is_empty() {
        return Value::Object(Default::default());
    }
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artifact is not valid JSON, ignoring");
            Value::Object(Default::default())
        }
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// The CI artifacts embedded in the review prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    /// Unified diff of the PR.
    pub diff: String,
    /// Type-checker log.
    pub typecheck: String,
    /// Linter report.
    pub lint: Value,
}

impl Artifacts {
    /// Read the diff, type-check log, and lint report from `workdir`.
    pub fn collect(workdir: &Path, files: &ArtifactConfig) -> Self {
        Self {
            diff: read_text(&workdir.join(&files.diff)),
            typecheck: read_text(&workdir.join(&files.typecheck)),
            lint: read_json(&workdir.join(&files.lint)),
        }
    }
}
