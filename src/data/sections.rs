use std::fmt;

use serde::{Deserialize, Serialize};

/// The three blobs a generated response is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Imports,
    Component,
    Test,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SectionKind::Imports => write!(f, "imports"),
            SectionKind::Component => write!(f, "page object"),
            SectionKind::Test => write!(f, "test"),
        }
    }
}

/// Which partitioning strategy produced a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionTier {
    /// Explicit delimiter markers.
    Markers,
    /// Declarations found in the parsed syntax tree.
    Structural,
    /// Line scan tracking indentation.
    Indentation,
    /// Nothing could be split; the whole input is the test section.
    Passthrough,
}

/// Raw output of the response partitioner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub imports: String,
    pub component: String,
    pub test: String,
    pub tier: PartitionTier,
}

impl Partition {
    pub fn has_sections(&self) -> bool {
        !self.component.is_empty() || !self.test.is_empty()
    }
}

/// Validated and normalized sections ready to be written out by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSections {
    pub imports: String,
    pub component: String,
    pub test: String,
    pub tier: PartitionTier,
}
