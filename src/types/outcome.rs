//! Per-key adjudication outcomes and their wire form.

use serde::{Deserialize, Serialize};

use super::envelope::Metadata;

/// Result of adjudicating one claim-set.
///
/// Produced by an [`Adjudicator`](crate::adjudicator::Adjudicator) for every
/// request key. The controller maps each variant to a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claims were evaluated.
    Verified(bool),
    /// The subject could not be resolved.
    SubjectNotFound,
    /// The claim-set was malformed for the registered concepts.
    ValidationFailed(Vec<String>),
    /// Anything else. The detail is for server-side logs only.
    InternalFailure(String),
}

impl ClaimOutcome {
    /// Status code this outcome maps to.
    pub fn code(&self) -> u16 {
        match self {
            Self::Verified(_) => 200,
            Self::SubjectNotFound => 404,
            Self::ValidationFailed(_) => 400,
            Self::InternalFailure(_) => 500,
        }
    }

    /// Shorthand for a single-diagnostic validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![message.into()])
    }

    /// Shorthand for an internal failure.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::InternalFailure(detail.into())
    }
}

/// Wire form of one key's result.
///
/// `verified` is present only on the success path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimVerification {
    /// Verification result, absent on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    /// Status metadata.
    pub metadata: Metadata,
}

impl ClaimVerification {
    /// Successful verification.
    pub fn verified(verified: bool) -> Self {
        Self {
            verified: Some(verified),
            metadata: Metadata::new(200),
        }
    }

    /// Error entry carrying only metadata.
    pub fn failed(metadata: Metadata) -> Self {
        Self {
            verified: None,
            metadata,
        }
    }
}
