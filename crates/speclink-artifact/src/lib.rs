//! speclink artifact model
//!
//! Typed values shared by every stage of the requirement pipeline.
//!
//! # Core Concepts
//!
//! - [`SpecId`] / [`RequirementId`]: identifiers (`SPEC-007`, `REQ-SPEC-007-U-01`)
//! - [`RequirementKind`]: the five EARS sentence shapes
//! - [`Requirement`]: one classified requirement sentence
//! - [`TraceabilityEntry`]: derived requirement → code/test mapping
//! - [`GeneratedArtifact`]: a scaffolded file and its write outcome
//! - [`ContentHash`]: 32-byte Blake3 hash for change detection
//!
//! # Example
//!
//! ```rust
//! use speclink_artifact::{RequirementId, RequirementKind, SpecId};
//!
//! let spec = SpecId::new("SPEC-007");
//! let id = RequirementId::new(&spec, RequirementKind::EventDriven, 1);
//! assert_eq!(id.as_str(), "REQ-SPEC-007-E-01");
//! ```

#![warn(unreachable_pub)]

mod generated;
mod hash;
mod id;
mod requirement;
mod trace;

pub use generated::{GeneratedArtifact, Role, UnknownRoleName, WriteOutcome};
pub use hash::{ContentHash, HashError};
pub use id::{IdError, RequirementId, RequirementIdParts, RequirementKind, SpecId};
pub use requirement::{Confidence, IdSource, Requirement, SpecStatus, UnknownStatus};
pub use trace::{SourceLocation, TraceStatus, TraceabilityEntry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn id_embeds_spec_and_kind() {
        let spec = SpecId::new("SPEC-042");
        for (i, kind) in RequirementKind::ALL.into_iter().enumerate() {
            let id = RequirementId::new(&spec, kind, u32::try_from(i).unwrap() + 1);
            let parts = id.parts().unwrap();
            assert_eq!(parts.spec, spec.as_str());
            assert_eq!(parts.kind, kind);
        }
    }

    #[test]
    fn entry_serializes_snake_case_status() {
        let entry = TraceabilityEntry::new(
            RequirementId::raw("REQ-SPEC-001-U-01"),
            vec![SourceLocation::new("a.kt", 1)],
            vec![SourceLocation::new("ATest.kt", 2)],
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "tested");
        assert_eq!(json["requirement_id"], "REQ-SPEC-001-U-01");
    }
}
