//! Error types for pool submission, aggregation and block append.

use thiserror::Error;

/// Failures raised while collecting or aggregating claim scores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A score arrived before any claim label was opened.
    #[error("no claim is open; submit a claim label before its scores")]
    NoOpenClaim,

    /// Sample variance needs at least two scores.
    #[error("claim has {count} score(s); at least 2 are needed for sample statistics")]
    InsufficientSamples { count: usize },

    /// Finite scores whose variance does not fit in an f64.
    #[error("claim statistics overflow a 64-bit float")]
    NonFiniteStatistics,

    /// NaN and infinities have no stable textual form to commit.
    #[error("score {0} is not a finite number")]
    InvalidScore(f64),
}

/// Why `Ledger::try_append_block` refused a block. Chain state is untouched in both cases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppendError {
    #[error("previous_hash {found:?} does not match tip hash {expected:?}")]
    LinkageMismatch { expected: String, found: String },

    #[error("proof does not satisfy difficulty or does not match the block fingerprint")]
    InvalidProof,
}

/// Unparsable fork selector text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid fork selector {0:?}: expected latest, whole, all or a block index")]
pub struct ForkSelectorError(pub String);
