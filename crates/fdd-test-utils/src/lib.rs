//! Testing utilities for FDD workspace
//!
//! On-disk project fixtures and a small consistent documentation set.

#![allow(missing_docs)]

use fdd_registry::{DEFAULT_REGISTRY_PATH, ROOT_MARKER};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary project directory with a root marker and a registry
#[derive(Debug)]
pub struct ProjectFixture {
    dir: TempDir,
    artifacts: Vec<Value>,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
            artifacts: Vec::new(),
        };
        fixture.write_registry();
        fixture.with_config(json!({}))
    }

    /// Replace the root marker contents
    pub fn with_config(self, config: Value) -> Self {
        fs::write(self.dir.path().join(ROOT_MARKER), config.to_string()).unwrap();
        self
    }

    /// Register an FDD-format artifact
    pub fn register(self, kind: &str, system: &str, path: &str) -> Self {
        self.register_entry(json!({ "kind": kind, "system": system, "path": path }))
    }

    /// Register a raw registry entry
    pub fn register_entry(mut self, entry: Value) -> Self {
        self.artifacts.push(entry);
        self.write_registry();
        self
    }

    /// Write a file, creating parent directories
    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write_registry(&self) {
        let registry = json!({ "version": "1.0", "artifacts": self.artifacts });
        fs::write(self.dir.path().join(DEFAULT_REGISTRY_PATH), registry.to_string()).unwrap();
    }
}

pub const PRD: &str = "\
# Product Requirements

## A. Vision
**Purpose**: Let people sign in to the app.

## B. Actors
- [x] **ID**: `app-actor-user`
**Role**: Signs in and uses the app.

## C. Capabilities
- [x] **ID**: `app-capability-login`
**Actors**: `app-actor-user`
";

pub const ADR: &str = "\
# ADR-0001: Signed tokens

## A. Context
- [x] **ID**: `app-adr-signed-tokens`
**Date**: 2024-03-01
Sessions for `app-capability-login` must survive restarts.

## D. Decision Outcome
**Decision**: Issue signed tokens.
";

pub const DESIGN: &str = "\
# Overall Design

## A. Architecture Overview
**Purpose**: Serve `app-capability-login` from one service.
**ADRs**: `app-adr-signed-tokens`

## B. Requirements & Principles
- [x] **ID**: `app-req-auth`
**Capabilities**: `app-capability-login`

## C. Technical Architecture
A single stateless service.
";

pub const FEATURES: &str = "\
# Features

## A. Overview
**Purpose**: Delivery plan.

## B. Features

### 1. Login
- [x] **ID**: `app-feature-login`
**Slug**: login
**Requirements Covered**: `app-req-auth`
**Capabilities**: `app-capability-login`
";

pub const FEATURE_DESIGN: &str = "\
# Feature: Login

## A. Feature Context
**Feature**: `app-feature-login`
**Actors**: `app-actor-user`

## B. Actor Flows
- [ ] **ID**: `app-feature-login-flow-sign-in`

## C. Algorithms
- [x] **ID**: `app-feature-login-algo-check`
1. [x] - `ph-1` - Accept valid credentials - `inst-return-ok`

## F. Requirements
- [ ] **ID**: `app-feature-login-req-valid`
**Implements**: `app-req-auth`
";

/// Instruction tag the feature design above expects in code
pub const EXPECTED_TAG: &str = "app-feature-login-algo-check:ph-1:inst-return-ok";

/// Code file implementing [`EXPECTED_TAG`]
pub fn tagged_code() -> String {
    format!("// fdd-begin {EXPECTED_TAG}\nfn check() -> bool {{\n    true\n}}\n// fdd-end {EXPECTED_TAG}\n")
}

/// Code file with an empty [`EXPECTED_TAG`] block
pub fn empty_block_code() -> String {
    format!("// fdd-begin {EXPECTED_TAG}\n\n// fdd-end {EXPECTED_TAG}\n")
}

/// Consistent single-system project with the code in `src/login.rs`
pub fn standard_project(code: &str) -> ProjectFixture {
    ProjectFixture::new()
        .with_config(json!({ "code_root": "src" }))
        .register("PRD", "app", "architecture/PRD.md")
        .register("ADR", "app", "architecture/ADR")
        .register("DESIGN", "app", "architecture/DESIGN.md")
        .register("FEATURES", "app", "architecture/features/FEATURES.md")
        .register("FEATURE", "app", "architecture/features")
        .file("architecture/PRD.md", PRD)
        .file("architecture/ADR/0001-signed-tokens.md", ADR)
        .file("architecture/DESIGN.md", DESIGN)
        .file("architecture/features/FEATURES.md", FEATURES)
        .file("architecture/features/feature-login/DESIGN.md", FEATURE_DESIGN)
        .file("src/login.rs", code)
}
