//! Project configuration
//!
//! Stored in the root marker file itself. Every key is optional; an empty
//! marker file yields [`ProjectConfig::default`].

use crate::error::{RegistryError, RegistryResult};
use crate::registry::DEFAULT_REGISTRY_PATH;
use crate::root::ROOT_MARKER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Registry file, relative to the project root
    pub registry: PathBuf,
    /// Root of the code corpus scanned for tags, relative to the project root
    pub code_root: PathBuf,
    /// Corpus scan settings
    pub traceability: TraceabilityConfig,
    /// Worker threads for parallel stages; 0 selects the rayon default
    pub jobs: usize,
}

impl ProjectConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config stored in `root`'s marker file
    ///
    /// A missing or blank marker file is the default configuration.
    ///
    /// # Errors
    /// Returns [`RegistryError`] when the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> RegistryResult<Self> {
        let path = root.join(ROOT_MARKER);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(&path).map_err(|e| RegistryError::io_error(&path, e))?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&text).map_err(|e| RegistryError::parse_error(&path, e))
    }

    /// With registry path
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: impl Into<PathBuf>) -> Self {
        self.registry = registry.into();
        self
    }

    /// With code root
    #[inline]
    #[must_use]
    pub fn with_code_root(mut self, code_root: impl Into<PathBuf>) -> Self {
        self.code_root = code_root.into();
        self
    }

    /// With worker count
    #[inline]
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// With traceability settings
    #[inline]
    #[must_use]
    pub fn with_traceability(mut self, traceability: TraceabilityConfig) -> Self {
        self.traceability = traceability;
        self
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from(DEFAULT_REGISTRY_PATH),
            code_root: PathBuf::from("."),
            traceability: TraceabilityConfig::default(),
            jobs: 0,
        }
    }
}

/// Corpus scan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceabilityConfig {
    /// File extensions (without the dot) included in the corpus
    pub extensions: Vec<String>,
    /// Files larger than this many bytes are skipped
    pub max_file_size: u64,
    /// Enumeration stops after this many files
    pub max_files: usize,
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
    /// Per-extension comment syntax overrides
    pub comment_syntax: BTreeMap<String, CommentSyntaxConfig>,
}

impl TraceabilityConfig {
    /// With extension allow-list
    #[inline]
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// With file size cap
    #[inline]
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// With file count cap
    #[inline]
    #[must_use]
    pub fn with_max_files(mut self, files: usize) -> Self {
        self.max_files = files;
        self
    }
}

impl Default for TraceabilityConfig {
    fn default() -> Self {
        const EXTENSIONS: &[&str] = &[
            "rs", "py", "ts", "tsx", "js", "jsx", "mjs", "go", "java", "kt", "scala", "c", "h",
            "cc", "cpp", "hpp", "cs", "swift", "rb", "sh", "bash", "sql", "lua", "yaml", "yml",
            "toml", "md",
        ];
        Self {
            extensions: EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            max_file_size: 1024 * 1024,
            max_files: 20_000,
            exclude_dirs: ["target", "node_modules", ".git"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            comment_syntax: BTreeMap::new(),
        }
    }
}

/// Comment syntax override for one extension
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSyntaxConfig {
    /// Single-line comment prefixes
    pub single_line: Vec<String>,
    /// Multi-line `(start, end)` delimiter pairs
    pub multi_line: Vec<(String, String)>,
    /// Block-comment continuation prefixes
    pub continuation: Vec<String>,
}
