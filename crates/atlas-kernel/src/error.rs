//! Error types for Atlas kernel operations.

use crate::patch::PatchId;

/// Errors raised by covering, glueing and refinement operations.
///
/// All of these are local logic errors: nothing here performs I/O, so none
/// of them is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    /// A chart handle is not registered in the covering.
    ///
    /// Lookups by identity are a caller contract; hitting this means the
    /// handle came from a different covering.
    #[error("chart not found: {patch}")]
    ChartNotFound { patch: PatchId },

    /// Neither (first, second) nor (second, first) has a registered glueing.
    ///
    /// This is a legitimate "not known yet" state; query layers should
    /// treat it as information.
    #[error("no glueing registered for ({first}, {second})")]
    GlueingNotFound { first: PatchId, second: PatchId },

    /// Neither covering refines the other, and the general common
    /// refinement is not implemented.
    #[error("common refinement of coverings {first} and {second} is not supported")]
    UnsupportedRefinement { first: String, second: String },

    /// The covering has no charts and the operation needs at least one.
    #[error("covering has no charts")]
    EmptyCoveringDegenerate,

    /// A glueing or covering morphism does not fit the charts it claims.
    #[error("malformed glueing: {description}")]
    MalformedGlueing { description: String },

    /// The algebraic oracle reported a failure.
    #[error("oracle failure: {description}")]
    Oracle { description: String },
}

impl AtlasError {
    /// Shorthand for an oracle failure.
    pub fn oracle(description: impl Into<String>) -> Self {
        Self::Oracle {
            description: description.into(),
        }
    }

    /// Shorthand for a malformed glueing or morphism.
    pub fn malformed(description: impl Into<String>) -> Self {
        Self::MalformedGlueing {
            description: description.into(),
        }
    }
}
