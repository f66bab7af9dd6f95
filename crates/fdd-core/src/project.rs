//! Project context: root, configuration, registry and document cache

use crate::artifact::{adr_files, feature_dirs, DocumentCache, FeatureDir, FEATURE_CHANGES_FILE};
use crate::error::{CoreError, CoreResult};
use fdd_artifact::ArtifactKind;
use fdd_registry::{find_project_root, ProjectConfig, Registry, RegistryEntry};
use std::path::{Path, PathBuf};

/// Everything loaded once per run
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    registry: Registry,
    cache: DocumentCache,
}

impl Project {
    /// Discover the project containing `start` with its stored configuration
    ///
    /// # Errors
    /// Returns [`CoreError`] when the root, config or registry cannot be loaded.
    pub fn discover(start: &Path) -> CoreResult<Self> {
        Self::discover_with(start, |config| config)
    }

    /// Discover the project containing `start`, adjusting the stored configuration
    ///
    /// # Errors
    /// Returns [`CoreError`] when the root, config or registry cannot be loaded.
    pub fn discover_with(
        start: &Path,
        configure: impl FnOnce(ProjectConfig) -> ProjectConfig,
    ) -> CoreResult<Self> {
        let start = absolute(start)?;
        let root = find_project_root(&start)?;
        let config = configure(ProjectConfig::load(&root)?);
        Self::open(root, config)
    }

    /// Open a project at a known root
    ///
    /// # Errors
    /// Returns [`CoreError`] when the root does not exist or the registry cannot be loaded.
    pub fn open(root: impl AsRef<Path>, config: ProjectConfig) -> CoreResult<Self> {
        let root = absolute(root.as_ref())?;
        let registry = Registry::load(&root, &config.registry)?;
        for diagnostic in registry.diagnostics() {
            tracing::warn!(?diagnostic, "registry diagnostic");
        }
        tracing::info!(
            root = %root.display(),
            entries = registry.all().len(),
            "opened project"
        );
        Ok(Self {
            root,
            config,
            registry,
            cache: DocumentCache::new(),
        })
    }

    /// Project root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Effective configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Loaded registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Shared document cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Registry file path
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.root.join(&self.config.registry)
    }

    /// Root of the code corpus
    #[must_use]
    pub fn code_root(&self) -> PathBuf {
        self.root.join(&self.config.code_root)
    }

    /// Every artifact file behind a registry entry, with its kind
    ///
    /// Directory entries expand to their ADR files or feature designs and
    /// change logs.
    #[must_use]
    pub fn artifact_files(&self, entry: &RegistryEntry) -> Vec<(PathBuf, ArtifactKind)> {
        let path = self.registry.absolute(entry);
        match entry.kind {
            ArtifactKind::Adr if path.is_dir() => adr_files(&path)
                .into_iter()
                .map(|p| (p, ArtifactKind::Adr))
                .collect(),
            ArtifactKind::FeatureDesign if path.is_dir() => feature_dirs(&path)
                .into_iter()
                .flat_map(|f| {
                    let mut files = vec![(f.design(), ArtifactKind::FeatureDesign)];
                    let changes = f.changes();
                    if changes.is_file() {
                        files.push((changes, ArtifactKind::FeatureChanges));
                    }
                    files
                })
                .collect(),
            kind => vec![(path, kind)],
        }
    }

    /// Kind of the artifact at `path`, from the registry or else the file name
    #[must_use]
    pub fn kind_of(&self, path: &Path) -> Option<ArtifactKind> {
        if let Some(m) = self.registry.find_entry_for_path(path) {
            if m.exact && !m.entry.kind.registry_path_is_dir() {
                return Some(m.entry.kind);
            }
            if m.entry.kind == ArtifactKind::Adr {
                return Some(ArtifactKind::Adr);
            }
        }
        infer_kind(path)
    }
}

/// Guess an artifact kind from its file name
#[must_use]
pub fn infer_kind(path: &Path) -> Option<ArtifactKind> {
    let name = path.file_name()?.to_str()?;
    let in_feature = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(crate::artifact::FEATURE_DIR_PREFIX));
    match name {
        "PRD.md" => Some(ArtifactKind::Prd),
        "FEATURES.md" => Some(ArtifactKind::FeaturesManifest),
        n if n == FEATURE_CHANGES_FILE && in_feature => Some(ArtifactKind::FeatureChanges),
        "DESIGN.md" if in_feature => Some(ArtifactKind::FeatureDesign),
        "DESIGN.md" => Some(ArtifactKind::OverallDesign),
        _ => None,
    }
}

/// Absolute, symlink-resolved form of an existing path
///
/// # Errors
/// Returns [`CoreError::PathNotFound`] when the path does not exist.
pub fn absolute(path: &Path) -> CoreResult<PathBuf> {
    std::fs::canonicalize(path).map_err(|_| CoreError::PathNotFound(path.to_path_buf()))
}

/// Feature directory of a path under a feature root entry
#[must_use]
pub fn feature_of(project: &Project, entry: &RegistryEntry, path: &Path) -> Option<FeatureDir> {
    FeatureDir::containing(&project.registry().absolute(entry), path)
}
