//! Generated scaffold artifacts

use crate::hash::ContentHash;
use crate::id::{RequirementId, SpecId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Architectural role of a generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Domain model
    Model,
    /// Use case / interactor
    UseCase,
    /// Repository contract
    RepositoryInterface,
    /// Repository implementation
    RepositoryImpl,
    /// Presentation state holder
    ViewModel,
    /// UI screen
    Screen,
    /// Test scaffold
    Test,
}

impl Role {
    /// Every role, in generation order
    pub const ALL: [Self; 7] = [
        Self::Model,
        Self::UseCase,
        Self::RepositoryInterface,
        Self::RepositoryImpl,
        Self::ViewModel,
        Self::Screen,
        Self::Test,
    ];

    /// Snake-case name used in headers and template manifests
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::UseCase => "use_case",
            Self::RepositoryInterface => "repository_interface",
            Self::RepositoryImpl => "repository_impl",
            Self::ViewModel => "view_model",
            Self::Screen => "screen",
            Self::Test => "test",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleName;

    /// Accepts snake_case and camelCase spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "model" => Ok(Self::Model),
            "usecase" => Ok(Self::UseCase),
            "repositoryinterface" => Ok(Self::RepositoryInterface),
            "repositoryimpl" => Ok(Self::RepositoryImpl),
            "viewmodel" => Ok(Self::ViewModel),
            "screen" => Ok(Self::Screen),
            "test" => Ok(Self::Test),
            _ => Err(UnknownRoleName(s.to_string())),
        }
    }
}

/// Role name outside the known set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role name: '{0}'")]
pub struct UnknownRoleName(pub String);

/// What happened to a file during generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// New file written
    Created,
    /// Header region rewritten, body kept
    UpdatedHeader,
    /// File already byte-identical; nothing written
    Unchanged,
    /// Developer-owned file replaced because `force` was set
    Overwritten,
}

impl WriteOutcome {
    /// Whether the file on disk changed
    #[inline]
    #[must_use]
    pub const fn wrote(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Snake-case keyword
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::UpdatedHeader => "updated_header",
            Self::Unchanged => "unchanged",
            Self::Overwritten => "overwritten",
        }
    }
}

impl Display for WriteOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file produced by the scaffold generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Role of the file
    pub role: Role,
    /// Entity the file was generated for
    pub entity_name: String,
    /// Source document
    pub spec_id: SpecId,
    /// Requirements named in the header
    pub requirement_refs: Vec<RequirementId>,
    /// Output path
    pub path: PathBuf,
    /// Write outcome
    pub outcome: WriteOutcome,
    /// Hash of the file contents after generation
    pub content_hash: ContentHash,
}
