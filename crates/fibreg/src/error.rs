//! Error types for the computation registry.
//!
//! ## Error Cases
//! - `NotFound`: a lookup or update referenced an id the store never issued.
//! - `DuplicateId`: a record was inserted under an id that is already taken.
//! - `AlreadyComplete`: a finished record was completed or failed a second
//!   time.
//! - `ServiceShutdown`: a submission arrived after draining began.
//! - `UnknownAlgorithm`: an algorithm name could not be parsed.
//! - `Launch`: the compute thread for a submission could not be started.
//! - `ComputationPanicked`: the compute thread died before reporting a
//!   result.

use crate::SequenceId;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the registry.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No record is stored under the requested id.
    #[error("No sequence with id {id}")]
    NotFound { id: SequenceId },

    /// A record already exists under this id.
    #[error("Sequence {id} already exists")]
    DuplicateId { id: SequenceId },

    /// The record has already transitioned to complete or failed.
    #[error("Sequence {id} has already finished")]
    AlreadyComplete { id: SequenceId },

    /// The registry is draining or stopped and refuses new work.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// The algorithm name is not one of the supported names.
    #[error("Unknown algorithm: {name}")]
    UnknownAlgorithm { name: String },

    /// The compute thread could not be spawned.
    #[error("Failed to launch computation: {context}")]
    Launch { context: String },

    /// The compute thread exited without producing a result.
    #[error("Computation for sequence {id} panicked")]
    ComputationPanicked { id: SequenceId },
}

impl Error {
    /// Returns `true` for faults that indicate a defect rather than a caller
    /// mistake.
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId { .. }
                | Self::AlreadyComplete { .. }
                | Self::Launch { .. }
                | Self::ComputationPanicked { .. }
        )
    }
}
