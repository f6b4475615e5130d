//! Artifact naming and path helpers
//!
//! Every file a run produces is named after the source file so that runs on
//! different inputs never collide:
//!
//! - cuts: `<source>_part_<n>.<ext>` (1-based)
//! - effect outputs: `<part>_<effect>.<ext>`
//! - merged result: `<source>_final.<ext>`
//! - concat manifest: `<source>_list.txt`

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

/// Extension used when the source has none
const DEFAULT_EXTENSION: &str = "mp4";

/// Naming scheme for the artifacts of one source file
#[derive(Debug, Clone)]
pub struct ArtifactNames {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl ArtifactNames {
    /// Derive names from the source path
    pub fn for_source(source: &Path) -> Result<Self, DomainError> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                DomainError::BadArgs(format!("Invalid source path: {}", source.display()))
            })?;
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            dir,
            stem,
            extension,
        })
    }

    /// Path of the cut for a 1-based segment number
    pub fn part(&self, number: usize) -> PathBuf {
        self.dir
            .join(format!("{}_part_{}.{}", self.stem, number, self.extension))
    }

    /// Path of the merged output
    pub fn final_output(&self) -> PathBuf {
        self.dir
            .join(format!("{}_final.{}", self.stem, self.extension))
    }

    /// Path of the concat manifest
    pub fn manifest(&self) -> PathBuf {
        self.dir.join(format!("{}_list.txt", self.stem))
    }
}

/// Path of the effect output derived from a cut segment
pub fn effect_output_path(part: &Path, effect: &str) -> PathBuf {
    let stem = part
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = part
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let file_name = format!("{}_{}.{}", stem, sanitize_component(effect), extension);

    match part.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Keep only characters that are safe inside a file name
fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Quote a path for an ffmpeg concat manifest line
///
/// The concat demuxer reads single-quoted tokens; an embedded quote has to
/// close the token, be escaped, and reopen it.
pub fn quote_concat_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', "'\\''"))
}

/// Absolute form of a path without requiring it to exist
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Size of a file, or `None` when it does not exist
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
}

/// True when the file exists and has content
pub fn is_non_empty_file(path: &Path) -> bool {
    matches!(file_size(path), Some(size) if size > 0)
}

/// Marker appended or prepended when text is cut
const ELLIPSIS: &str = "...";

/// Head of `text`, at most `max_chars` characters including the cut marker
pub fn truncate_head(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let head: String = text.chars().take(keep).collect();
    if max_chars < ELLIPSIS.len() {
        return head;
    }
    format!("{}{}", head, ELLIPSIS)
}

/// Tail of `text`, at most `max_chars` characters including the cut marker
pub fn truncate_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let tail: String = text.chars().skip(count - keep).collect();
    if max_chars < ELLIPSIS.len() {
        return tail;
    }
    format!("{}{}", ELLIPSIS, tail)
}
