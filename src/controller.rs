//! Claims controller.
//!
//! Binds the two API operations to an injected [`Adjudicator`] and shapes
//! its output into envelopes. Per-key classification happens here; nothing
//! in this module talks HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::adjudicator::{Adjudicator, AdjudicatorError};
use crate::types::{ClaimOutcome, ClaimVerification, ClaimsRequest, ConceptDescriptor, Metadata};

/// Response of the list-concepts operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptListing {
    /// Always code 200.
    pub metadata: Metadata,
    /// Registered concepts, as the adjudicator reports them.
    pub values: Vec<ConceptDescriptor>,
}

/// Response of the validate-claims operation: caller key → result.
pub type ClaimsResponse = BTreeMap<String, ClaimVerification>;

/// Summary counts of one validated batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Keys in the request.
    pub total: usize,
    /// Keys that produced a verification result.
    pub verified: usize,
    /// Keys that produced an error entry.
    pub failed: usize,
}

impl BatchSummary {
    /// Count the entries of a response.
    pub fn of(response: &ClaimsResponse) -> Self {
        let verified = response.values().filter(|v| v.verified.is_some()).count();
        Self {
            total: response.len(),
            verified,
            failed: response.len() - verified,
        }
    }
}

/// Controller over a shared adjudicator.
pub struct ClaimsController<A: Adjudicator + ?Sized> {
    adjudicator: Arc<A>,
}

impl<A: Adjudicator + ?Sized> ClaimsController<A> {
    /// Create a controller around an adjudicator.
    pub fn new(adjudicator: Arc<A>) -> Self {
        Self { adjudicator }
    }

    /// The wrapped adjudicator.
    pub fn adjudicator(&self) -> &Arc<A> {
        &self.adjudicator
    }

    /// List the adjudicator's concepts. Always code 200.
    pub fn list_concepts(&self) -> ConceptListing {
        ConceptListing {
            metadata: Metadata::new(200),
            values: self.adjudicator.concepts(),
        }
    }

    /// Adjudicate a batch and classify every key.
    ///
    /// The response holds exactly the request's keys. A failure of the whole
    /// adjudicator call is returned as an error; there are no partial results.
    pub async fn validate_claims(&self, request: &ClaimsRequest) -> Result<ClaimsResponse, AdjudicatorError> {
        if request.is_empty() {
            return Ok(ClaimsResponse::new());
        }

        let mut outcomes = self.adjudicator.verify_claims(request).await?;

        let mut response = ClaimsResponse::new();
        for key in request.keys() {
            let outcome = outcomes.remove(key).unwrap_or_else(|| {
                warn!(claim_key = %key, "Adjudicator returned no result for key");
                ClaimOutcome::internal("missing result")
            });
            response.insert(key.clone(), classify(key, outcome));
        }

        for key in outcomes.keys() {
            warn!(claim_key = %key, "Dropping result for key not present in request");
        }

        debug!(keys = response.len(), "Claims validated");
        Ok(response)
    }
}

impl<A: Adjudicator + ?Sized> Clone for ClaimsController<A> {
    fn clone(&self) -> Self {
        Self {
            adjudicator: Arc::clone(&self.adjudicator),
        }
    }
}

/// Map one outcome to its wire entry.
fn classify(key: &str, outcome: ClaimOutcome) -> ClaimVerification {
    match outcome {
        ClaimOutcome::Verified(verified) => ClaimVerification::verified(verified),
        ClaimOutcome::SubjectNotFound => ClaimVerification::failed(Metadata::new(404)),
        ClaimOutcome::ValidationFailed(diagnostics) => {
            ClaimVerification::failed(Metadata::new(400).with_information(diagnostics))
        }
        ClaimOutcome::InternalFailure(detail) => {
            error!(claim_key = %key, error = %detail, "Claim adjudication failed");
            ClaimVerification::failed(Metadata::new(500))
        }
    }
}
