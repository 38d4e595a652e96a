//! Testing utilities for the speclink workspace
//!
//! Sample documents, throwaway source trees and catalogs shared by the
//! integration tests.

#![allow(missing_docs)]

use speclink_artifact::{RequirementKind, SpecId};
use speclink_core::{CapabilityModule, Catalog, Pipeline, SpeclinkConfig};
use speclink_document::{parse, SpecDocument};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two requirements, a notes section and no traceability section
pub const SAMPLE_SPEC: &str = "---
id: SPEC-007
feature: User Profile
status: draft
version: 1.0.0
author: test
---
# User Profile Specification

## Overview

Profiles for signed-in users.

## 2. Requirements (EARS Format)

### 2.1 Ubiquitous
- **REQ-SPEC-007-U-01**: The system shall validate an email address.
- **REQ-SPEC-007-U-02**: The system shall cache profiles in a local database.

### 2.2 Event-Driven
- **REQ-SPEC-007-E-01**: WHEN the user submits the form, the system shall persist the record.

## Notes

Hand-written notes stay put.
";

pub fn sample_doc() -> SpecDocument {
    parse(SAMPLE_SPEC).unwrap()
}

/// Valid document with `n` ubiquitous requirements
pub fn minimal_spec(spec: &str, n: usize) -> String {
    let mut text = format!("---\nid: {spec}\nfeature: Widget\nversion: 1.0.0\nstatus: draft\n---\n## Requirements\n\n");
    let id = SpecId::new(spec);
    for seq in 1..=n {
        let req = speclink_artifact::RequirementId::new(&id, RequirementKind::Ubiquitous, seq as u32);
        writeln!(text, "- **{req}**: The system shall handle case {seq}.").unwrap();
    }
    text
}

pub fn minimal_doc(spec: &str, n: usize) -> SpecDocument {
    parse(&minimal_spec(spec, n)).unwrap()
}

pub fn net_catalog() -> Catalog {
    Catalog::new(vec![
        CapabilityModule::new("net", ["api", "network"]).with_description("HTTP networking"),
        CapabilityModule::new("charts", ["chart", "graph"]),
    ])
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(SpeclinkConfig::default()).unwrap()
}

/// Temporary directory with helpers for writing source files
#[derive(Debug)]
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    pub fn with(self, relative: &str, text: &str) -> Self {
        self.write(relative, text);
        self
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).unwrap();
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}
