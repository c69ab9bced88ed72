//! Adjudicator boundary.
//!
//! The middleware never evaluates claims itself. It hands the request to an
//! [`Adjudicator`] and shapes whatever comes back.

pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{ClaimOutcome, ClaimsRequest, ConceptDescriptor};

/// Failure of a whole adjudication call, before any per-key result exists.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdjudicatorError {
    /// The engine refused the request as a whole.
    #[error("Adjudicator rejected request: {0}")]
    Rejected(String),
    /// The engine is unavailable or failed internally.
    #[error("Adjudicator failure: {0}")]
    Internal(String),
}

/// Trait for claims adjudication engines.
///
/// Implementations must be safe for concurrent use; one instance is shared by
/// every request.
#[async_trait]
pub trait Adjudicator: Send + Sync {
    /// Registered concepts, in registration order.
    fn concepts(&self) -> Vec<ConceptDescriptor>;

    /// Adjudicate every claim-set in `request`.
    ///
    /// Should return exactly one outcome per request key.
    async fn verify_claims(
        &self,
        request: &ClaimsRequest,
    ) -> Result<BTreeMap<String, ClaimOutcome>, AdjudicatorError>;
}

#[async_trait]
impl<A: Adjudicator + ?Sized> Adjudicator for Arc<A> {
    fn concepts(&self) -> Vec<ConceptDescriptor> {
        (**self).concepts()
    }

    async fn verify_claims(
        &self,
        request: &ClaimsRequest,
    ) -> Result<BTreeMap<String, ClaimOutcome>, AdjudicatorError> {
        (**self).verify_claims(request).await
    }
}

pub use memory::{ConceptDefinition, ConceptKind, InMemoryAdjudicator, ValueSource};
