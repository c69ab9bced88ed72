//! # claims-adjudicator-middleware
//!
//! HTTP middleware that exposes a pluggable claims adjudicator.
//!
//! Callers supply an [`Adjudicator`]: a registry of concepts that knows how
//! to evaluate claims such as "the subject's age is greater than 18". This
//! crate does not evaluate anything itself. It:
//!
//! 1. Enforces a fixed API contract on incoming requests
//! 2. Hands valid batches to the adjudicator
//! 3. Shapes every per-key result into a uniform metadata envelope
//!
//! ## Architecture
//!
//! ```text
//! Request → ContractJson (contract check) → ClaimsController → Adjudicator
//!                 ↓ violation                        ↓
//!             ApiError (error stage)          ClaimVerification envelopes
//! ```
//!
//! ## Envelope
//!
//! ```text
//! { "metadata": { "validation_response": { "code": 200, "message": "Success" } } }
//! ```
//!
//! Codes are restricted to 200, 201, 204, 400, 401, 403, 404, 409 and 500.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod adjudicator;
pub mod contract;
pub mod controller;
pub mod service;

// Re-exports
pub use types::{
    reason_phrase, build_validation_response, build_metadata, build_metadata_envelope,
    ValidationResponse, Metadata, MetadataEnvelope,
    Claim, ClaimSet, ClaimsRequest, Mode,
    ConceptDescriptor, Relationship,
    ClaimOutcome, ClaimVerification,
};
pub use adjudicator::{
    Adjudicator, AdjudicatorError,
    InMemoryAdjudicator, ConceptDefinition, ConceptKind, ValueSource,
};
pub use contract::{ContractEnforcer, ContractError, ContractViolation, Operation, API_DESCRIPTION};
pub use controller::{ClaimsController, ClaimsResponse, ConceptListing, BatchSummary};
pub use service::{
    build_middleware, mount, create_app, contract_error_handler,
    ApiError, ServiceConfig, ConfigError, LogFormat,
};
