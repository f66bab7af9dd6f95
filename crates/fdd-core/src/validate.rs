//! Cascading validation
//!
//! A path is mapped to its registry entry, its dependencies are resolved
//! and loaded bottom-up, and the artifact is checked against them.
//! Directory entries fan out: ADR sets per file, feature roots per feature
//! directory, the project root per registry entry tier by tier. Work inside
//! one tier runs on the bounded worker pool; tiers run in validation order
//! so dependency documents land in the shared cache before their dependents
//! need them.

use crate::artifact::{adr_files, defined_ids, feature_dirs, FeatureDir, Sources};
use crate::checks::{
    check_cross_references, check_identifiers, check_placeholders, CrossRefContext,
    DependencyIds,
};
use crate::error::{CoreError, CoreResult};
use crate::issue::{Issue, IssueType};
use crate::project::{absolute, feature_of, Project};
use crate::report::{ArtifactReport, DependencyRef};
use crate::status::check_status;
use fdd_artifact::{check_structure, ArtifactKind};
use fdd_registry::{DependencyResolver, PathMatch, RegistryEntry};
use fdd_trace::{ExpectedSet, TraceabilityScanner};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One artifact to check
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    entry: &'a RegistryEntry,
    kind: ArtifactKind,
    path: &'a Path,
    feature: Option<&'a FeatureDir>,
}

/// Dependencies loaded for one target
#[derive(Debug, Default)]
struct DependencySet {
    ids: BTreeMap<ArtifactKind, DependencyIds>,
    sources: BTreeMap<ArtifactKind, Sources>,
}

/// Validator over one project
#[derive(Debug)]
pub struct Validator<'p> {
    project: &'p Project,
    pool: rayon::ThreadPool,
    skip_code: bool,
}

impl<'p> Validator<'p> {
    /// Create a validator with a worker pool sized by the project's `jobs`
    ///
    /// # Errors
    /// Returns [`CoreError::Pool`] when the pool cannot be built.
    pub fn new(project: &'p Project) -> CoreResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(project.config().jobs)
            .thread_name(|i| format!("fdd-worker-{i}"))
            .build()?;
        Ok(Self {
            project,
            pool,
            skip_code: false,
        })
    }

    /// Skip the code traceability scan
    #[inline]
    #[must_use]
    pub fn with_skip_code(mut self, skip: bool) -> Self {
        self.skip_code = skip;
        self
    }

    /// Validate an artifact file, artifact directory, or the project root
    ///
    /// Unregistered paths yield a skipped passing report.
    ///
    /// # Errors
    /// Returns [`CoreError`] when the path does not exist or the validated
    /// file itself cannot be read.
    pub fn validate(&self, path: &Path) -> CoreResult<ArtifactReport> {
        let path = absolute(path)?;
        let report = self.pool.install(|| self.dispatch(&path))?;
        tracing::info!(
            path = %path.display(),
            status = ?report.status,
            issues = report.issue_count(),
            "validation finished"
        );
        Ok(report)
    }

    /// Validate every registered artifact
    #[must_use]
    pub fn validate_project(&self) -> ArtifactReport {
        self.pool.install(|| self.project_report())
    }

    fn dispatch(&self, path: &Path) -> CoreResult<ArtifactReport> {
        if path == self.project.root() {
            return Ok(self.project_report());
        }

        let Some(PathMatch { entry, exact }) = self.project.registry().find_entry_for_path(path)
        else {
            tracing::warn!(path = %path.display(), "artifact is not registered, skipping");
            return Ok(ArtifactReport::skipped(path).finalize());
        };

        if path.is_file() {
            std::fs::File::open(path).map_err(|e| CoreError::io_error(path, e))?;
        }

        let report = match (entry.kind, exact) {
            (_, true) => self.validate_entry(entry),
            (ArtifactKind::Adr, false) if path.is_file() => self
                .validate_artifact(Target {
                    entry,
                    kind: ArtifactKind::Adr,
                    path,
                    feature: None,
                })
                .finalize(),
            (ArtifactKind::FeatureDesign, false) => self.validate_in_feature_root(entry, path),
            _ => {
                tracing::warn!(path = %path.display(), "path inside a registered directory is not an artifact");
                ArtifactReport::skipped(path).finalize()
            }
        };
        Ok(report)
    }

    fn validate_entry(&self, entry: &RegistryEntry) -> ArtifactReport {
        let path = self.project.registry().absolute(entry);
        match entry.kind {
            ArtifactKind::Adr if path.is_dir() => self.validate_adr_set(entry, &path),
            ArtifactKind::FeatureDesign if path.is_dir() => self.validate_feature_root(entry, &path),
            ArtifactKind::FeatureDesign => {
                let feature = FeatureDir::new(path.parent().unwrap_or(&path));
                self.validate_feature_file(entry, &feature, ArtifactKind::FeatureDesign, true)
            }
            kind => self
                .validate_artifact(Target {
                    entry,
                    kind,
                    path: &path,
                    feature: None,
                })
                .finalize(),
        }
    }

    fn validate_in_feature_root(&self, entry: &RegistryEntry, path: &Path) -> ArtifactReport {
        let Some(feature) = feature_of(self.project, entry, path) else {
            return ArtifactReport::skipped(path).finalize();
        };
        if path == feature.dir {
            self.validate_feature(entry, &feature, true)
        } else if path == feature.design() {
            self.validate_feature_file(entry, &feature, ArtifactKind::FeatureDesign, true)
        } else if path == feature.changes() {
            self.validate_feature_file(entry, &feature, ArtifactKind::FeatureChanges, false)
        } else {
            tracing::warn!(path = %path.display(), "not a feature design or change log, skipping");
            ArtifactReport::skipped(path).finalize()
        }
    }

    fn project_report(&self) -> ArtifactReport {
        let registry = self.project.registry();
        let mut report = ArtifactReport::new(self.project.root(), None);
        let registry_path = self.project.registry_path();
        for diagnostic in registry.diagnostics() {
            report.push(Issue::registry(&registry_path, diagnostic));
        }

        for kind in ArtifactKind::REGISTERED {
            let entries = registry.resolve_all_of_kind(kind);
            tracing::debug!(%kind, entries = entries.len(), "validating tier");
            let tier: Vec<ArtifactReport> = entries
                .par_iter()
                .map(|entry| self.validate_entry(entry))
                .collect();
            report.merge_children(tier);
        }
        report.finalize()
    }

    fn validate_adr_set(&self, entry: &RegistryEntry, dir: &Path) -> ArtifactReport {
        let files = adr_files(dir);
        let children: Vec<ArtifactReport> = files
            .par_iter()
            .map(|file| {
                self.validate_artifact(Target {
                    entry,
                    kind: ArtifactKind::Adr,
                    path: file,
                    feature: None,
                })
                .finalize()
            })
            .collect();

        let mut report = ArtifactReport::new(dir, Some(ArtifactKind::Adr)).with_system(&entry.system);
        if entry.format.is_fdd() {
            if let Ok(all) = self.project.cache().get(dir, ArtifactKind::Adr) {
                let reported: BTreeSet<&Issue> = children.iter().flat_map(|c| &c.errors).collect();
                let cross_file: Vec<Issue> = check_identifiers(&all, None)
                    .into_iter()
                    .filter(|i| i.kind == IssueType::DuplicateId && !reported.contains(i))
                    .collect();
                report.extend(cross_file);
            }
        }
        report.merge_children(children);
        report.finalize()
    }

    fn validate_feature_root(&self, entry: &RegistryEntry, root: &Path) -> ArtifactReport {
        let features = feature_dirs(root);
        tracing::debug!(root = %root.display(), features = features.len(), "validating feature root");

        let children: Vec<ArtifactReport> = features
            .par_iter()
            .map(|feature| self.validate_feature(entry, feature, false))
            .collect();

        let mut report =
            ArtifactReport::new(root, Some(ArtifactKind::FeatureDesign)).with_system(&entry.system);
        report.merge_children(children);

        let mut expected = ExpectedSet::new();
        for feature in &features {
            expected.extend(self.expected_for(feature));
        }
        self.attach_traceability(&mut report, &expected);
        report.finalize()
    }

    fn validate_feature(&self, entry: &RegistryEntry, feature: &FeatureDir, trace: bool) -> ArtifactReport {
        let design = feature.design();
        let changes = feature.changes();
        let mut children = vec![self
            .validate_artifact(Target {
                entry,
                kind: ArtifactKind::FeatureDesign,
                path: &design,
                feature: Some(feature),
            })
            .finalize()];
        if changes.is_file() {
            children.push(
                self.validate_artifact(Target {
                    entry,
                    kind: ArtifactKind::FeatureChanges,
                    path: &changes,
                    feature: Some(feature),
                })
                .finalize(),
            );
        }

        let mut report = ArtifactReport::new(&feature.dir, None).with_system(&entry.system);
        report.merge_children(children);
        if trace {
            self.attach_traceability(&mut report, &self.expected_for(feature));
        }
        report.finalize()
    }

    fn validate_feature_file(
        &self,
        entry: &RegistryEntry,
        feature: &FeatureDir,
        kind: ArtifactKind,
        trace: bool,
    ) -> ArtifactReport {
        let path = match kind {
            ArtifactKind::FeatureChanges => feature.changes(),
            _ => feature.design(),
        };
        let mut report = self.validate_artifact(Target {
            entry,
            kind,
            path: &path,
            feature: Some(feature),
        });
        if trace {
            self.attach_traceability(&mut report, &self.expected_for(feature));
        }
        report.finalize()
    }

    fn expected_for(&self, feature: &FeatureDir) -> ExpectedSet {
        let mut expected = ExpectedSet::new();
        if let Ok(sources) = self.project.cache().get(&feature.design(), ArtifactKind::FeatureDesign) {
            for source in sources.iter() {
                expected.extend(ExpectedSet::from_document(&source.doc));
            }
        }
        expected
    }

    fn attach_traceability(&self, report: &mut ArtifactReport, expected: &ExpectedSet) {
        if self.skip_code {
            return;
        }
        let code_root = self.project.code_root();
        let scanner = TraceabilityScanner::new(&self.project.config().traceability);
        match scanner.scan(&code_root, expected) {
            Ok(traceability) => report.traceability = Some(traceability),
            Err(e) => report.push(Issue::new(IssueType::File, &code_root, e.to_string())),
        }
    }

    /// Check one artifact; the report is not finalized
    fn validate_artifact(&self, target: Target<'_>) -> ArtifactReport {
        tracing::debug!(path = %target.path.display(), kind = %target.kind, "validating artifact");
        let mut report =
            ArtifactReport::new(target.path, Some(target.kind)).with_system(&target.entry.system);
        let deps = self.load_dependencies(&target, &mut report);

        let sources = match self.project.cache().get(target.path, target.kind) {
            Ok(sources) => sources,
            Err(issue) => {
                report.push(issue);
                return report;
            }
        };

        if !target.entry.format.is_fdd() {
            tracing::debug!(path = %target.path.display(), "free-form artifact, structural checks skipped");
            return report;
        }

        for source in sources.iter() {
            report.push_structure(&source.path, &check_structure(&source.doc));
            report.extend(check_placeholders(source));
        }
        report.extend(check_identifiers(&sources, target.feature.map(|f| f.slug.as_str())));

        if target.entry.traceability_enabled {
            let own_ids = self.own_ids(&target, &sources);
            let ctx = CrossRefContext {
                kind: target.kind,
                own_ids: &own_ids,
                feature_slug: target.feature.map(|f| f.slug.as_str()),
                dependencies: &deps.ids,
            };
            report.extend(check_cross_references(&sources, &ctx));
        }

        if target.kind == ArtifactKind::FeaturesManifest {
            if let (Some(prd), Some(design)) = (
                deps.sources.get(&ArtifactKind::Prd),
                deps.sources.get(&ArtifactKind::OverallDesign),
            ) {
                report.extend(check_status(prd, design, &sources));
            }
        }

        report
    }

    /// Identifiers defined by the artifact the target belongs to
    fn own_ids(&self, target: &Target<'_>, sources: &Sources) -> BTreeSet<String> {
        if target.kind == ArtifactKind::Adr {
            let dir = self.project.registry().absolute(target.entry);
            if dir.is_dir() {
                if let Ok(all) = self.project.cache().get(&dir, ArtifactKind::Adr) {
                    return defined_ids(&all);
                }
            }
        }
        defined_ids(sources)
    }

    fn load_dependencies(&self, target: &Target<'_>, report: &mut ArtifactReport) -> DependencySet {
        let registry = self.project.registry();
        let resolved = DependencyResolver::new(registry).resolve(&target.entry.system, target.kind);
        for missing in &resolved.missing {
            report.push(Issue::missing_dependency(target.path, missing));
        }
        for issue in &resolved.chain_issues {
            report.push(Issue::chain(target.path, issue));
        }

        let mut set = DependencySet::default();
        for dep in resolved.in_validation_order() {
            let path: PathBuf = match (dep.kind, target.feature) {
                (ArtifactKind::FeatureDesign, Some(feature)) => feature.design(),
                (ArtifactKind::FeatureDesign, None) => continue,
                _ => registry.absolute(dep),
            };
            report.dependencies.push(DependencyRef {
                kind: dep.kind,
                system: dep.system.clone(),
                path: path.clone(),
            });

            if !dep.format.is_fdd() {
                set.ids.insert(
                    dep.kind,
                    DependencyIds {
                        path,
                        ids: BTreeSet::new(),
                        checkable: false,
                    },
                );
                continue;
            }

            match self.project.cache().get(&path, dep.kind) {
                Ok(sources) => {
                    set.ids.insert(
                        dep.kind,
                        DependencyIds {
                            path,
                            ids: defined_ids(&sources),
                            checkable: dep.traceability_enabled,
                        },
                    );
                    set.sources.insert(dep.kind, sources);
                }
                Err(issue) => {
                    report.push(issue);
                    set.ids.insert(
                        dep.kind,
                        DependencyIds {
                            path,
                            ids: BTreeSet::new(),
                            checkable: false,
                        },
                    );
                }
            }
        }
        set
    }
}
