//! Artifact loading
//!
//! Reads artifact files fresh from disk and parses them into
//! [`Document`]s. ADR registry paths are directories of `*.md` files;
//! FEATURE registry paths are roots of `feature-<slug>/` directories.
//!
//! Parsed documents are shared through [`DocumentCache`] so a dependency
//! read by several validations in one run is parsed once.

use crate::issue::{Issue, IssueType};
use dashmap::DashMap;
use fdd_artifact::{ArtifactKind, Document};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Feature design file name inside a feature directory
pub const FEATURE_DESIGN_FILE: &str = "DESIGN.md";
/// Feature change log file name inside a feature directory
pub const FEATURE_CHANGES_FILE: &str = "CHANGES.md";
/// Prefix of feature directory names
pub const FEATURE_DIR_PREFIX: &str = "feature-";

/// One parsed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// File path
    pub path: PathBuf,
    /// Parsed content
    pub doc: Document,
}

/// Documents making up one artifact (one file, or every ADR in a directory)
pub type Sources = Arc<Vec<SourceDocument>>;

/// Identifiers defined anywhere in `sources`
#[must_use]
pub fn defined_ids(sources: &[SourceDocument]) -> BTreeSet<String> {
    sources
        .iter()
        .flat_map(|s| s.doc.definitions().map(|d| d.identifier.to_string()))
        .collect()
}

fn read_text(path: &Path) -> Result<String, Issue> {
    if !path.exists() {
        return Err(Issue::new(
            IssueType::File,
            path,
            format!("path not found: {}", path.display()),
        ));
    }
    if !path.is_file() {
        return Err(Issue::new(IssueType::File, path, "expected a file"));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| Issue::new(IssueType::File, path, format!("unreadable: {e}")))?;
    if bytes.contains(&0) {
        return Err(Issue::new(IssueType::File, path, "binary content"));
    }
    String::from_utf8(bytes).map_err(|_| Issue::new(IssueType::File, path, "not valid UTF-8"))
}

/// `*.md` files under an ADR directory, sorted by path
#[must_use]
pub fn adr_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|x| x.eq_ignore_ascii_case("md"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Read and parse the documents of one artifact
///
/// # Errors
/// Returns a `file` [`Issue`] when the path is missing, has the wrong
/// shape, or cannot be read as text.
pub fn load_documents(path: &Path, kind: ArtifactKind) -> Result<Vec<SourceDocument>, Issue> {
    if kind == ArtifactKind::Adr && path.is_dir() {
        return adr_files(path)
            .into_iter()
            .map(|file| {
                let text = read_text(&file)?;
                Ok(SourceDocument {
                    doc: Document::parse(kind, text),
                    path: file,
                })
            })
            .collect();
    }
    let text = read_text(path)?;
    tracing::debug!(path = %path.display(), %kind, "parsed artifact");
    Ok(vec![SourceDocument {
        path: path.to_path_buf(),
        doc: Document::parse(kind, text),
    }])
}

/// Concurrent parse cache keyed by path and kind
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: DashMap<(PathBuf, ArtifactKind), Result<Sources, Issue>>,
}

impl DocumentCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load through the cache
    ///
    /// # Errors
    /// Returns the load [`Issue`], cached like a success.
    pub fn get(&self, path: &Path, kind: ArtifactKind) -> Result<Sources, Issue> {
        let key = (path.to_path_buf(), kind);
        if let Some(hit) = self.entries.get(&key) {
            return hit.value().clone();
        }
        // Parse outside the shard lock; a concurrent loader may win the insert
        let loaded = load_documents(path, kind).map(Arc::new);
        self.entries.entry(key).or_insert(loaded).value().clone()
    }

    /// Number of cached artifacts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `feature-<slug>/` directory under a feature root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDir {
    /// Slug from the directory name
    pub slug: String,
    /// Directory path
    pub dir: PathBuf,
}

impl FeatureDir {
    /// Describe the feature directory at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let slug = name.strip_prefix(FEATURE_DIR_PREFIX).unwrap_or(name).to_string();
        Self { slug, dir }
    }

    /// Feature design path
    #[must_use]
    pub fn design(&self) -> PathBuf {
        self.dir.join(FEATURE_DESIGN_FILE)
    }

    /// Change log path
    #[must_use]
    pub fn changes(&self) -> PathBuf {
        self.dir.join(FEATURE_CHANGES_FILE)
    }

    /// Feature directory containing `path`, given the feature root
    #[must_use]
    pub fn containing(root: &Path, path: &Path) -> Option<Self> {
        let first = path.strip_prefix(root).ok()?.components().next()?;
        Some(Self::new(root.join(first.as_os_str())))
    }
}

/// Feature directories directly under `root`, sorted by name
#[must_use]
pub fn feature_dirs(root: &Path) -> Vec<FeatureDir> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(FEATURE_DIR_PREFIX))
        })
        .map(|e| FeatureDir::new(e.into_path()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_single_and_adr_dir() {
        let dir = tempfile::tempdir().unwrap();
        let adr = dir.path().join("adr");
        fs::create_dir_all(&adr).unwrap();
        fs::write(adr.join("0002-b.md"), "- [x] **ID**: `ns-adr-b`\n").unwrap();
        fs::write(adr.join("0001-a.md"), "- [x] **ID**: `ns-adr-a`\n").unwrap();
        fs::write(adr.join("notes.txt"), "ignored").unwrap();

        let sources = load_documents(&adr, ArtifactKind::Adr).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].path.ends_with("0001-a.md"));
        let ids = defined_ids(&sources);
        assert!(ids.contains("ns-adr-a") && ids.contains("ns-adr-b"));
    }

    #[test]
    fn load_errors_are_file_issues() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_documents(&dir.path().join("PRD.md"), ArtifactKind::Prd).unwrap_err();
        assert_eq!(missing.kind, IssueType::File);
        let shape = load_documents(dir.path(), ArtifactKind::Prd).unwrap_err();
        assert!(shape.message.contains("expected a file"));
        let bin = dir.path().join("bin.md");
        fs::write(&bin, b"\0\0").unwrap();
        assert!(load_documents(&bin, ArtifactKind::Prd).is_err());
    }

    #[test]
    fn cache_parses_once() {
        let dir = tempfile::tempdir().unwrap();
        let prd = dir.path().join("PRD.md");
        fs::write(&prd, "## A. Vision\n").unwrap();
        let cache = DocumentCache::new();
        let a = cache.get(&prd, ArtifactKind::Prd).unwrap();
        fs::write(&prd, "changed").unwrap();
        let b = cache.get(&prd, ArtifactKind::Prd).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn feature_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("feature-beta")).unwrap();
        fs::create_dir_all(dir.path().join("feature-alpha")).unwrap();
        fs::create_dir_all(dir.path().join("shared")).unwrap();
        let dirs = feature_dirs(dir.path());
        let slugs: Vec<_> = dirs.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta"]);

        let inside = dir.path().join("feature-alpha/DESIGN.md");
        let found = FeatureDir::containing(dir.path(), &inside).unwrap();
        assert_eq!(found.slug, "alpha");
        assert_eq!(found.design(), inside);
    }
}
