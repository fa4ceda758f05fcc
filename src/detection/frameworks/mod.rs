//! Per-framework detection and deep analysis
//!
//! Each [`MobileFramework`] recognises its own manifest layout and fills in
//! the framework-specific parts of a [`ProjectAnalysis`]. The analyzer tries
//! them in [`registry`] order and the first match wins.

pub mod android;
pub mod cordova;
pub mod flutter;
pub mod react_native;

use crate::detection::types::{ProjectAnalysis, ProjectType};
use crate::stack::{FrameworkId, LanguageId};
use std::io;
use std::path::Path;

/// Read-only view over an enumerated project tree.
///
/// `base` is the manifest directory; `has`, `has_dir` and `read` take paths
/// relative to it.
#[derive(Debug, Clone)]
pub struct ProjectFiles<'a> {
    root: &'a Path,
    files: &'a [String],
    base: String,
}

impl<'a> ProjectFiles<'a> {
    /// `files` must be sorted, as produced by the file walk.
    pub fn new(root: &'a Path, files: &'a [String]) -> Self {
        Self {
            root,
            files,
            base: String::new(),
        }
    }

    pub fn scoped(&self, base: &str) -> Self {
        Self {
            root: self.root,
            files: self.files,
            base: base.trim_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn all(&self) -> &'a [String] {
        self.files
    }

    fn rooted(&self, relative: &str) -> String {
        if self.base.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", self.base, relative)
        }
    }

    pub fn has(&self, relative: &str) -> bool {
        self.files.binary_search(&self.rooted(relative)).is_ok()
    }

    /// True when at least one file lives under `relative/`.
    pub fn has_dir(&self, relative: &str) -> bool {
        let prefix = format!("{}/", self.rooted(relative.trim_end_matches('/')));
        self.files.iter().any(|f| f.starts_with(&prefix))
    }

    pub fn read(&self, relative: &str) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(self.rooted(relative)))
    }

    pub fn any_with_extension(&self, extension: &str) -> bool {
        self.files.iter().any(|f| f.ends_with(extension))
    }

    /// Paths whose final component equals `name`, shallowest first.
    pub fn named(&self, name: &str) -> Vec<&'a String> {
        let mut matches: Vec<&String> = self
            .files
            .iter()
            .filter(|f| file_name(f) == name)
            .collect();
        matches.sort_by_key(|f| (f.matches('/').count(), f.as_str()));
        matches
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a relative path, empty for top-level files.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

pub trait MobileFramework: Send + Sync {
    fn id(&self) -> FrameworkId;

    fn project_type(&self) -> ProjectType;

    fn language(&self, files: &ProjectFiles) -> LanguageId;

    /// Returns the manifest directory when the tree belongs to this framework.
    fn detect(&self, files: &ProjectFiles) -> Option<String>;

    /// Fills in manifest data, build config and the required-file checklist.
    /// `files` is scoped to the detected manifest directory.
    fn analyze(&self, files: &ProjectFiles, analysis: &mut ProjectAnalysis);
}

/// Detection order. Hybrid frameworks come first because their trees also
/// contain native Android build files.
pub fn registry() -> Vec<Box<dyn MobileFramework>> {
    vec![
        Box::new(react_native::ReactNativeFramework),
        Box::new(flutter::FlutterFramework),
        Box::new(android::AndroidFramework),
        Box::new(cordova::CordovaFramework),
    ]
}

/// Reads the framework's primary manifest.
///
/// A missing manifest is recorded as both a missing file and an error, which
/// ends the framework branch. Other read failures are recorded as errors.
pub(crate) fn read_manifest(
    files: &ProjectFiles,
    relative: &str,
    analysis: &mut ProjectAnalysis,
) -> Option<String> {
    match files.read(relative) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            analysis.add_missing(relative);
            analysis
                .errors
                .push(format!("Required manifest {} is missing", relative));
            None
        }
        Err(e) => {
            analysis
                .errors
                .push(format!("Failed to read {}: {}", relative, e));
            None
        }
    }
}

/// Lowercase alphanumeric form of a project name, usable in package ids.
pub fn sanitize_identifier(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        "app".to_string()
    } else {
        cleaned
    }
}
