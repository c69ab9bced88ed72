//! Error stage of the request pipeline.
//!
//! Every failure that escapes a handler or extractor ends up here as an
//! [`ApiError`] and leaves as an envelope. Contract violations keep their
//! itemized messages; everything else is logged and answered with a bare 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::adjudicator::AdjudicatorError;
use crate::contract::{ContractError, ContractViolation};
use crate::types::{Metadata, MetadataEnvelope};

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request does not match the API contract.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    /// The adjudicator failed before producing per-key results.
    #[error(transparent)]
    Adjudicator(#[from] AdjudicatorError),
    /// The contract could not be applied.
    #[error(transparent)]
    Configuration(#[from] ContractError),
    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Envelope metadata the client sees for this error.
    pub fn metadata(&self) -> Metadata {
        match self {
            Self::Contract(violation) => {
                Metadata::new(400).with_information(violation.violations.iter().cloned())
            }
            Self::Adjudicator(_) | Self::Configuration(_) | Self::Internal(_) => Metadata::new(500),
        }
    }
}

/// Translate an error into the response the client receives.
///
/// Request-shape violations become 400 with `validation_information`. Any
/// other error is logged here and answered with a bare 500 envelope.
pub fn contract_error_handler(err: &ApiError) -> (StatusCode, Json<MetadataEnvelope>) {
    let metadata = err.metadata();
    match err {
        ApiError::Contract(violation) => {
            warn!(
                violations = violation.violations.len(),
                error = %violation,
                "Request rejected by contract"
            );
        }
        other => {
            error!(error = %other, "Request failed");
        }
    }
    (metadata.status(), Json(metadata.into()))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        contract_error_handler(&self).into_response()
    }
}
