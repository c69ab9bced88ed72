//! Core types for the claims middleware.

pub mod envelope;
pub mod concept;
pub mod claim;
pub mod outcome;

pub use envelope::{
    reason_phrase, coerce_code, build_validation_response, build_metadata,
    build_metadata_envelope, ValidationResponse, Metadata, MetadataEnvelope,
    ALLOWED_CODES,
};
pub use concept::{ConceptDescriptor, Relationship};
pub use claim::{Claim, ClaimSet, ClaimsRequest, Mode};
pub use outcome::{ClaimOutcome, ClaimVerification};
