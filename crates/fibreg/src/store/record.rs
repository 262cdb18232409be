use crate::Algorithm;
use core::{fmt, time::Duration};
use num_bigint::BigUint;

/// Identifier assigned to a submitted computation.
///
/// Ids start at `1` and strictly increase in allocation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SequenceId(u64);

impl SequenceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SequenceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SequenceStatus {
    Pending,
    Complete,
    /// The computation could not produce a result. Terminal, like
    /// [`SequenceStatus::Complete`].
    Failed,
}

impl SequenceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result-bearing state of a record.
///
/// The result and the elapsed time only exist together with the complete
/// status, so a reader can never observe one without the other. A failure
/// carries the reason instead of a result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Complete { result: BigUint, elapsed: Duration },
    Failed { reason: String, elapsed: Duration },
}

/// One computation request and, once finished, its result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceRecord {
    id: SequenceId,
    algorithm: Algorithm,
    input: u64,
    outcome: Outcome,
}

impl SequenceRecord {
    /// Creates a pending record.
    pub const fn pending(id: SequenceId, algorithm: Algorithm, input: u64) -> Self {
        Self {
            id,
            algorithm,
            input,
            outcome: Outcome::Pending,
        }
    }

    pub const fn id(&self) -> SequenceId {
        self.id
    }

    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub const fn input(&self) -> u64 {
        self.input
    }

    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn status(&self) -> SequenceStatus {
        match self.outcome {
            Outcome::Pending => SequenceStatus::Pending,
            Outcome::Complete { .. } => SequenceStatus::Complete,
            Outcome::Failed { .. } => SequenceStatus::Failed,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, Outcome::Complete { .. })
    }

    /// `true` once the record is complete or failed; it will not change again.
    pub fn is_finished(&self) -> bool {
        !matches!(self.outcome, Outcome::Pending)
    }

    /// Why the computation failed, or `None` unless the record failed.
    pub fn failure(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    /// The computed term, or `None` while pending.
    pub fn result(&self) -> Option<&BigUint> {
        match &self.outcome {
            Outcome::Complete { result, .. } => Some(result),
            Outcome::Pending | Outcome::Failed { .. } => None,
        }
    }

    /// Time from launch to completion or failure, or `None` while pending.
    pub fn elapsed(&self) -> Option<Duration> {
        match self.outcome {
            Outcome::Pending => None,
            Outcome::Complete { elapsed, .. } | Outcome::Failed { elapsed, .. } => Some(elapsed),
        }
    }

    /// Moves a pending record to `outcome`. Returns `false` if the record had
    /// already finished.
    pub(crate) fn finish(&mut self, outcome: Outcome) -> bool {
        if self.is_finished() {
            return false;
        }
        self.outcome = outcome;
        true
    }
}
