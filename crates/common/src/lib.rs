pub mod pretty;

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::SizeRange;

/// Canonical error type shared across the estimator subsystems.
#[derive(Error, Debug)]
pub enum SizeError {
    #[error("parse: {0}")]
    Parse(String),
    #[error("missing {0}")]
    Missing(String),
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("report: {0}")]
    Report(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `SizeError`.
pub type SizeResult<T> = Result<T, SizeError>;

/// Capability shared by every node of the schema tree: a display name, a
/// short descriptive label, and an estimated byte range.
pub trait Sizeable {
    /// Estimated storage footprint of this node.
    fn size(&self) -> SizeRange;
    /// Short descriptive label, e.g. a type or engine summary.
    fn kind(&self) -> String;
    /// Display name.
    fn name(&self) -> &str;
}

/// A flattened, already-sized report row.
///
/// Engine strategies hand these to the report layer so per-key overhead can
/// be baked into the stored range without mutating the schema node it came
/// from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    name: String,
    kind: String,
    size: SizeRange,
}

impl Item {
    /// Snapshot of a node at its own reported size.
    pub fn of(node: &impl Sizeable) -> Item {
        Item {
            name: node.name().to_string(),
            kind: node.kind(),
            size: node.size(),
        }
    }

    /// Snapshot of a node with an overriding size.
    pub fn resized(node: &impl Sizeable, size: SizeRange) -> Item {
        Item {
            name: node.name().to_string(),
            kind: node.kind(),
            size,
        }
    }
}

impl Sizeable for Item {
    fn size(&self) -> SizeRange {
        self.size
    }

    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
