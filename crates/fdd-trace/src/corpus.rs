//! Corpus enumeration and per-file scanning
//!
//! Files are filtered by the extension allow-list and size cap; binary or
//! non-UTF-8 files are dropped without a diagnostic. Markdown files enter
//! the corpus only when they contain a tag marker.

use crate::error::{TraceError, TraceResult};
use crate::syntax::CommentSyntax;
use crate::tags::{has_tag_marker, scan_text, TagError};
use fdd_registry::TraceabilityConfig;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Tag diagnostic with its file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LocatedTagError {
    /// File the diagnostic belongs to
    pub path: PathBuf,
    /// The diagnostic
    #[serde(flatten)]
    pub error: TagError,
}

/// Per-file accumulator produced by one worker
#[derive(Debug, Clone, Default)]
pub struct FileScan {
    /// Found base identifiers
    pub found_scopes: BTreeSet<String>,
    /// Found instruction tags
    pub found_instructions: BTreeSet<String>,
    /// Diagnostics with file context
    pub errors: Vec<LocatedTagError>,
}

/// Union of every file's accumulator
#[derive(Debug, Clone, Default)]
pub struct CorpusScan {
    /// Files actually scanned
    pub files_scanned: usize,
    /// Found base identifiers across the corpus
    pub found_scopes: BTreeSet<String>,
    /// Found instruction tags across the corpus
    pub found_instructions: BTreeSet<String>,
    /// Diagnostics, sorted by file then line
    pub errors: Vec<LocatedTagError>,
}

impl CorpusScan {
    fn absorb(mut self, file: FileScan) -> Self {
        self.files_scanned += 1;
        self.found_scopes.extend(file.found_scopes);
        self.found_instructions.extend(file.found_instructions);
        self.errors.extend(file.errors);
        self
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}

fn is_excluded_dir(entry: &DirEntry, config: &TraceabilityConfig) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.exclude_dirs.iter().any(|d| d == name))
}

/// List candidate files under `root`, in walk order, capped at `max_files`
///
/// # Errors
/// Returns [`TraceError::CodeRootNotFound`] when `root` is not a directory.
pub fn enumerate(root: &Path, config: &TraceabilityConfig) -> TraceResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(TraceError::CodeRootNotFound(root.to_path_buf()));
    }

    let files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, config))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| config.extensions.iter().any(|a| a.eq_ignore_ascii_case(x)))
        })
        .take(config.max_files)
        .map(DirEntry::into_path)
        .collect();

    if files.len() == config.max_files {
        tracing::warn!(
            root = %root.display(),
            max_files = config.max_files,
            "corpus truncated at file limit"
        );
    }
    Ok(files)
}

/// Read a corpus file, or `None` when it is too large, unreadable or binary
#[must_use]
pub fn read_source(path: &Path, max_file_size: u64) -> Option<String> {
    let meta = std::fs::metadata(path).ok()?;
    if meta.len() > max_file_size {
        tracing::debug!(path = %path.display(), size = meta.len(), "skipping oversized file");
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    if bytes.contains(&0) {
        tracing::debug!(path = %path.display(), "skipping binary file");
        return None;
    }
    String::from_utf8(bytes).ok()
}

/// Scan one file; `None` when it is skipped
#[must_use]
pub fn scan_file(path: &Path, config: &TraceabilityConfig) -> Option<FileScan> {
    let text = read_source(path, config.max_file_size)?;
    if is_markdown(path) && !has_tag_marker(&text) {
        return None;
    }

    let syntax = CommentSyntax::for_path(path, &config.comment_syntax);
    let scan = scan_text(&text, &syntax);
    Some(FileScan {
        found_scopes: scan.found_scopes,
        found_instructions: scan.found_instructions,
        errors: scan
            .errors
            .into_iter()
            .map(|error| LocatedTagError {
                path: path.to_path_buf(),
                error,
            })
            .collect(),
    })
}

/// Scan every file in parallel on the current rayon pool, then reduce
#[must_use]
pub fn scan_files(files: &[PathBuf], config: &TraceabilityConfig) -> CorpusScan {
    let per_file: Vec<FileScan> = files
        .par_iter()
        .filter_map(|path| scan_file(path, config))
        .collect();

    let mut corpus = per_file
        .into_iter()
        .fold(CorpusScan::default(), CorpusScan::absorb);
    corpus.errors.sort();
    tracing::debug!(
        files = corpus.files_scanned,
        errors = corpus.errors.len(),
        "corpus scanned"
    );
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn enumerate_filters_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "a").unwrap();
        fs::write(dir.path().join("src/b.rs"), "b").unwrap();
        fs::write(dir.path().join("src/c.bin"), "c").unwrap();
        fs::write(dir.path().join("target/d.rs"), "d").unwrap();

        let config = TraceabilityConfig::default();
        let files = enumerate(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 2);

        let capped = enumerate(dir.path(), &config.clone().with_max_files(1)).unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn enumerate_missing_root() {
        let err = enumerate(Path::new("/definitely/not/here"), &TraceabilityConfig::default());
        assert!(matches!(err, Err(TraceError::CodeRootNotFound(_))));
    }

    #[test]
    fn skips_binary_oversized_and_plain_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("x.rs");
        fs::write(&bin, b"fn\0main").unwrap();
        let big = dir.path().join("big.rs");
        fs::write(&big, "x".repeat(64)).unwrap();
        let prose = dir.path().join("notes.md");
        fs::write(&prose, "just prose mentioning ns-adr-x:ph-1:inst-y\n").unwrap();

        let config = TraceabilityConfig::default().with_max_file_size(32);
        assert!(scan_file(&bin, &config).is_none());
        assert!(scan_file(&big, &config).is_none());
        assert!(scan_file(&prose, &config).is_none());
    }

    #[test]
    fn markdown_with_markers_is_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("guide.md");
        fs::write(
            &doc,
            "<!-- fdd-begin ns-adr-x -->\nSome text\n<!-- fdd-end ns-adr-x -->\n",
        )
        .unwrap();
        let scan = scan_file(&doc, &TraceabilityConfig::default()).unwrap();
        assert!(scan.errors.is_empty());
        assert!(scan.found_scopes.contains("ns-adr-x"));
    }

    #[test]
    fn reduce_unions_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.rs");
        let b = dir.path().join("b.py");
        fs::write(&a, "// fdd-begin ns-adr-a\nx();\n// fdd-end ns-adr-a\n").unwrap();
        fs::write(&b, "# fdd-begin ns-adr-b\n").unwrap();
        let corpus = scan_files(&[a, b.clone()], &TraceabilityConfig::default());
        assert_eq!(corpus.files_scanned, 2);
        assert!(corpus.found_scopes.contains("ns-adr-a"));
        assert_eq!(corpus.errors.len(), 1);
        assert_eq!(corpus.errors[0].path, b);
    }
}
