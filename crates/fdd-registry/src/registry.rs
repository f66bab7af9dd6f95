//! Artifact registry
//!
//! Maps `(system, kind)` to registered paths and `system` to its parent.
//!
//! ```json
//! {"version": "1.0", "artifacts": [
//!   {"kind": "PRD", "system": "core", "path": "architecture/PRD.md", "format": "FDD"},
//!   {"kind": "FEATURE", "system": "billing", "path": "billing/features", "parent": "core"}
//! ]}
//! ```

use crate::error::{RegistryError, RegistryResult};
use crate::root::normalize;
use fdd_artifact::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Default registry location relative to the project root
pub const DEFAULT_REGISTRY_PATH: &str = "fdd-registry.json";

/// Authoring format of a registered artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ArtifactFormat {
    /// Structured FDD convention; subject to structural rules
    Fdd,
    /// Free-form text; bypasses structural rules
    Other(String),
}

impl ArtifactFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("fdd") {
            Self::Fdd
        } else {
            Self::Other(raw.to_string())
        }
    }

    /// True for the structured convention
    #[inline]
    #[must_use]
    pub fn is_fdd(&self) -> bool {
        matches!(self, Self::Fdd)
    }
}

impl From<ArtifactFormat> for String {
    fn from(format: ArtifactFormat) -> Self {
        match format {
            ArtifactFormat::Fdd => "FDD".to_string(),
            ArtifactFormat::Other(s) => s,
        }
    }
}

/// One registered artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Position in the registry file
    pub index: usize,
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Owning system
    pub system: String,
    /// Project-root-relative path (directory for ADR and FEATURE)
    pub path: PathBuf,
    /// Authoring format
    pub format: ArtifactFormat,
    /// Parent system consulted for missing dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Whether cross-references touching this artifact are checked
    pub traceability_enabled: bool,
}

/// Problem in an otherwise loadable registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RegistryDiagnostic {
    /// Entry with a kind name that is not registrable
    UnknownKind {
        /// Entry position
        index: usize,
        /// Kind text as written
        kind: String,
    },
    /// Two entries of one system name different parents; the first wins
    ConflictingParent {
        /// System name
        system: String,
        /// Parent kept
        kept: String,
        /// Parent ignored
        ignored: String,
    },
}

/// Problem found while walking a parent chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChainIssue {
    /// The chain revisits `system`; the walk stops there
    ParentCycle {
        /// System that started the walk
        origin: String,
        /// First system seen twice
        system: String,
    },
    /// `system` names a parent that has no registry entries
    UnknownParent {
        /// Child system
        system: String,
        /// Missing parent
        parent: String,
    },
}

/// Systems visited by a parent-chain walk: self first, then ancestors
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParentChain {
    /// Visited systems, nearest first
    pub systems: Vec<String>,
    /// Why the walk stopped early, if it did
    pub issue: Option<ChainIssue>,
}

/// Result of matching a filesystem path against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMatch<'a> {
    /// Matching entry
    pub entry: &'a RegistryEntry,
    /// True when the path equals the entry path; false when it lies inside a directory entry
    pub exact: bool,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    version: Option<String>,
    artifacts: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    kind: String,
    system: String,
    path: String,
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default = "default_true")]
    traceability_enabled: bool,
}

fn default_format() -> String {
    "FDD".to_string()
}

fn default_true() -> bool {
    true
}

/// Loaded and indexed registry
#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
    version: Option<String>,
    entries: Vec<RegistryEntry>,
    by_system_kind: HashMap<(String, ArtifactKind), Vec<usize>>,
    parents: HashMap<String, String>,
    systems: BTreeSet<String>,
    diagnostics: Vec<RegistryDiagnostic>,
}

impl Registry {
    /// Load `registry_path` (relative to `root` unless absolute)
    ///
    /// # Errors
    /// Returns [`RegistryError`] when the file cannot be read or parsed.
    pub fn load(root: &Path, registry_path: &Path) -> RegistryResult<Self> {
        let path = root.join(registry_path);
        let text =
            std::fs::read_to_string(&path).map_err(|e| RegistryError::io_error(&path, e))?;
        let registry = Self::from_json(root, &text).map_err(|e| match e {
            RegistryError::Parse { source, .. } => RegistryError::parse_error(&path, source),
            other => other,
        })?;
        tracing::debug!(
            path = %path.display(),
            entries = registry.entries.len(),
            systems = registry.systems.len(),
            "loaded registry"
        );
        Ok(registry)
    }

    /// Build a registry from JSON text
    ///
    /// # Errors
    /// Returns [`RegistryError::Parse`] when the text does not match the schema.
    pub fn from_json(root: &Path, text: &str) -> RegistryResult<Self> {
        let file: RegistryFile =
            serde_json::from_str(text).map_err(|e| RegistryError::parse_error("<registry>", e))?;

        let mut registry = Self {
            root: root.to_path_buf(),
            version: file.version,
            entries: Vec::new(),
            by_system_kind: HashMap::new(),
            parents: HashMap::new(),
            systems: BTreeSet::new(),
            diagnostics: Vec::new(),
        };

        for (index, raw) in file.artifacts.into_iter().enumerate() {
            let Some(kind) = ArtifactKind::from_registry_name(&raw.kind) else {
                tracing::warn!(index, kind = %raw.kind, "skipping registry entry with unknown kind");
                registry
                    .diagnostics
                    .push(RegistryDiagnostic::UnknownKind { index, kind: raw.kind });
                continue;
            };
            registry.push(RegistryEntry {
                index,
                kind,
                system: raw.system,
                path: normalize(Path::new(&raw.path)),
                format: ArtifactFormat::parse(&raw.format),
                parent: raw.parent.filter(|p| !p.is_empty()),
                traceability_enabled: raw.traceability_enabled,
            });
        }

        Ok(registry)
    }

    fn push(&mut self, entry: RegistryEntry) {
        if let Some(parent) = &entry.parent {
            match self.parents.get(&entry.system) {
                Some(kept) if kept != parent => {
                    self.diagnostics.push(RegistryDiagnostic::ConflictingParent {
                        system: entry.system.clone(),
                        kept: kept.clone(),
                        ignored: parent.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    self.parents.insert(entry.system.clone(), parent.clone());
                }
            }
        }
        self.systems.insert(entry.system.clone());
        let slot = self.entries.len();
        self.by_system_kind
            .entry((entry.system.clone(), entry.kind))
            .or_default()
            .push(slot);
        self.entries.push(entry);
    }

    /// Project root the registry paths are relative to
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Declared registry version
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// All entries in file order
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Known system names
    #[inline]
    #[must_use]
    pub fn systems(&self) -> &BTreeSet<String> {
        &self.systems
    }

    /// Load-time diagnostics
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[RegistryDiagnostic] {
        &self.diagnostics
    }

    /// Entries of one kind in one system, in file order
    pub fn entries<'a>(
        &'a self,
        system: &str,
        kind: ArtifactKind,
    ) -> impl Iterator<Item = &'a RegistryEntry> + 'a {
        self.by_system_kind
            .get(&(system.to_string(), kind))
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    /// Declared parent of a system
    #[must_use]
    pub fn parent_of(&self, system: &str) -> Option<&str> {
        self.parents.get(system).map(String::as_str)
    }

    /// Self, then ancestors, stopping at the first already-visited system
    #[must_use]
    pub fn parent_chain(&self, system: &str) -> ParentChain {
        let mut chain = ParentChain::default();
        let mut visited = HashSet::new();
        let mut current = Some(system.to_string());

        while let Some(name) = current.take() {
            if !visited.insert(name.clone()) {
                chain.issue = Some(ChainIssue::ParentCycle {
                    origin: system.to_string(),
                    system: name,
                });
                break;
            }
            if let Some(parent) = self.parent_of(&name) {
                if self.systems.contains(parent) {
                    current = Some(parent.to_string());
                } else {
                    chain.issue = Some(ChainIssue::UnknownParent {
                        system: name.clone(),
                        parent: parent.to_string(),
                    });
                }
            }
            chain.systems.push(name);
        }

        chain
    }

    /// Every entry of a kind across all systems (project-wide discovery)
    #[must_use]
    pub fn resolve_all_of_kind(&self, kind: ArtifactKind) -> Vec<&RegistryEntry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    /// Nearest entry of `kind` along the parent chain of `system`
    ///
    /// Within one system, the first entry whose path is an existing
    /// directory wins when the kind is directory-based; otherwise the first
    /// entry in file order.
    #[must_use]
    pub fn resolve_one_of_kind(&self, system: &str, kind: ArtifactKind) -> Option<&RegistryEntry> {
        self.parent_chain(system)
            .systems
            .iter()
            .find_map(|s| self.pick_one(s, kind))
    }

    fn pick_one(&self, system: &str, kind: ArtifactKind) -> Option<&RegistryEntry> {
        let mut candidates = self.entries(system, kind).peekable();
        let first = *candidates.peek()?;
        if kind.registry_path_is_dir() {
            if let Some(dir) = candidates.find(|e| self.absolute(e).is_dir()) {
                return Some(dir);
            }
        }
        Some(first)
    }

    /// Absolute path of an entry
    #[must_use]
    pub fn absolute(&self, entry: &RegistryEntry) -> PathBuf {
        self.root.join(&entry.path)
    }

    /// Find the entry owning `path` (absolute, or relative to the root)
    ///
    /// Exact matches win over directory containment; among directory
    /// entries the deepest match wins.
    #[must_use]
    pub fn find_entry_for_path(&self, path: &Path) -> Option<PathMatch<'_>> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?.to_path_buf()
        } else {
            path.to_path_buf()
        };
        let relative = normalize(&relative);

        if let Some(entry) = self.entries.iter().find(|e| e.path == relative) {
            return Some(PathMatch { entry, exact: true });
        }

        self.entries
            .iter()
            .filter(|e| e.kind.registry_path_is_dir() && relative.starts_with(&e.path))
            .max_by_key(|e| e.path.components().count())
            .map(|entry| PathMatch {
                entry,
                exact: false,
            })
    }
}
