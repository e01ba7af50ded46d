//! Error taxonomy for the ChainTicket client.
//!
//! Every failure a caller can observe is one of these variants. The taxonomy
//! separates local caller mistakes (`InvalidArgument`), exhausted-but-bounded
//! transient handling (`FreshnessUnavailable`), timing races recovered by
//! rebuilding (`StaleTransaction`), authoritative rejections that must never
//! be retried (`RejectedByNode`), and transport trouble the caller may retry
//! with backoff (`Unreachable`).

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Result alias used throughout the client.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failure taxonomy for address derivation, instruction building, transaction
/// assembly, submission, and bulk orchestration.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No bump byte in 0-255 produced an off-curve candidate.
    ///
    /// This violates a domain assumption and is never expected in practice,
    /// but it is a checked condition, not an assumed one.
    #[error("derivation exhausted: no off-curve candidate under program {program}")]
    DerivationExhausted {
        /// The deriving program the search ran under
        program: Pubkey,
    },

    /// A caller-supplied field failed validation or encoding.
    ///
    /// Nothing was submitted; fix the argument and call again.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No freshness token could be obtained within the configured attempts.
    #[error("freshness token unavailable after {attempts} attempts: {last_error}")]
    FreshnessUnavailable {
        /// How many fetch attempts were made before giving up
        attempts: u32,
        /// Display form of the final fetch failure
        last_error: String,
    },

    /// The freshness token expired before the node accepted the transaction.
    ///
    /// Recovered by assembling a brand-new envelope; a stale envelope is
    /// never patched or resubmitted.
    #[error("transaction expired before the node accepted it")]
    StaleTransaction,

    /// The node or the program explicitly rejected the transaction.
    ///
    /// Authoritative verdict (business rule or protocol violation); surfaced
    /// verbatim and never retried by this layer.
    #[error("rejected by node: {0}")]
    RejectedByNode(String),

    /// Transport-level failure reaching the node.
    #[error("node unreachable: {0}")]
    Unreachable(String),

    /// A bulk pipeline exceeded its configured deadline.
    #[error("pipeline exceeded deadline of {secs}s")]
    Timeout {
        /// The deadline that was exceeded
        secs: u64,
    },

    /// Signing the assembled message failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Account data from the node does not match the expected layout.
    #[error("malformed account data: {0}")]
    MalformedAccount(String),

    /// Internal invariant violation; indicates a bug, not an input problem.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether the caller may reasonably retry after this error.
    ///
    /// `StaleTransaction` counts as retryable because a full reassembly is a
    /// valid recovery; `FreshnessUnavailable` does not, because its bounded
    /// retries have already been spent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StaleTransaction => true,
            Self::Unreachable(_) => true,

            Self::DerivationExhausted { .. } => false,
            Self::InvalidArgument(_) => false,
            Self::FreshnessUnavailable { .. } => false,
            Self::RejectedByNode(_) => false,
            Self::Timeout { .. } => false,
            Self::Signing(_) => false,
            Self::MalformedAccount(_) => false,
            Self::Internal(_) => false,
        }
    }

    /// Error category label for metrics and log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::DerivationExhausted { .. } => "derivation",
            Self::InvalidArgument(_) => "argument",
            Self::FreshnessUnavailable { .. } => "freshness",
            Self::StaleTransaction => "stale",
            Self::RejectedByNode(_) => "rejected",
            Self::Unreachable(_) => "transport",
            Self::Timeout { .. } => "deadline",
            Self::Signing(_) => "signing",
            Self::MalformedAccount(_) => "account",
            Self::Internal(_) => "internal",
        }
    }
}

// Convenience constructors for the string-carrying variants
impl ClientError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Create a node-rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::RejectedByNode(reason.into())
    }

    /// Create a transport error.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable(reason.into())
    }

    /// Create a malformed-account error.
    pub fn malformed_account(reason: impl Into<String>) -> Self {
        Self::MalformedAccount(reason.into())
    }

    /// Create an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}
