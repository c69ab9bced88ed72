//! Response envelope builder.
//!
//! Every response leaving the middleware carries the same metadata shape:
//!
//! ```text
//! { "metadata": {
//!     "validation_response": { "code": 400, "message": "Bad Request" },
//!     "validation_information": ["..."]      // only when diagnostics exist
//! } }
//! ```
//!
//! All functions here are pure. Codes outside [`ALLOWED_CODES`] are coerced
//! to 500, and a missing or blank message falls back to the canonical phrase
//! for the (coerced) code.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Status codes the envelope may carry. Anything else becomes 500.
pub const ALLOWED_CODES: [u16; 9] = [200, 201, 204, 400, 401, 403, 404, 409, 500];

/// Code substituted for anything outside [`ALLOWED_CODES`].
pub const FALLBACK_CODE: u16 = 500;

/// Canonical reason phrase for a status code.
///
/// Total over all integers: unrecognized values (negative, zero, or simply
/// not in the allow-list) map to `"Internal Server Error"`. The code itself
/// is not coerced here.
pub fn reason_phrase(code: i64) -> &'static str {
    match code {
        200 => "Success",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Internal Server Error",
    }
}

/// Coerce an arbitrary integer to an allow-listed status code.
pub fn coerce_code(code: i64) -> u16 {
    u16::try_from(code)
        .ok()
        .filter(|c| ALLOWED_CODES.contains(c))
        .unwrap_or(FALLBACK_CODE)
}

/// The `{code, message}` pair inside every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Allow-listed HTTP-style status code.
    pub code: u16,
    /// Human readable message; the canonical phrase unless overridden.
    pub message: String,
}

impl ValidationResponse {
    /// The HTTP status matching this response's code.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Response metadata: the validation response plus optional diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Status code and message.
    pub validation_response: ValidationResponse,
    /// Ordered diagnostics. Omitted from the wire when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_information: Vec<String>,
}

impl Metadata {
    /// Metadata for `code` with the canonical message and no diagnostics.
    pub fn new(code: i64) -> Self {
        build_metadata(code, None, Vec::new())
    }

    /// Replace the diagnostics list.
    pub fn with_information<I, S>(mut self, information: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_information = information.into_iter().map(Into::into).collect();
        self
    }

    /// The HTTP status matching this metadata's code.
    pub fn status(&self) -> StatusCode {
        self.validation_response.status()
    }
}

/// `{ "metadata": ... }` wrapper used for bare responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEnvelope {
    /// The wrapped metadata.
    pub metadata: Metadata,
}

impl From<Metadata> for MetadataEnvelope {
    fn from(metadata: Metadata) -> Self {
        Self { metadata }
    }
}

/// Build a [`ValidationResponse`].
///
/// `code` is coerced to the allow-list first. A `None` or blank message is
/// replaced by the canonical phrase of the coerced code.
pub fn build_validation_response(code: i64, message: Option<String>) -> ValidationResponse {
    let code = coerce_code(code);
    let message = message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| reason_phrase(i64::from(code)).to_string());

    ValidationResponse { code, message }
}

/// Build [`Metadata`] with an optional message and diagnostics.
pub fn build_metadata(code: i64, message: Option<String>, diagnostics: Vec<String>) -> Metadata {
    Metadata {
        validation_response: build_validation_response(code, message),
        validation_information: diagnostics,
    }
}

/// Build a [`MetadataEnvelope`] with an optional message and diagnostics.
pub fn build_metadata_envelope(
    code: i64,
    message: Option<String>,
    diagnostics: Vec<String>,
) -> MetadataEnvelope {
    build_metadata(code, message, diagnostics).into()
}
