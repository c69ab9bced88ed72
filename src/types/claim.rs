//! Claim request types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the claims of one claim-set combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every claim must hold.
    #[default]
    All,
    /// At least one claim must hold.
    Any,
}

/// A single assertion about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Concept the claim is about.
    pub concept: String,
    /// Relationship identifier, kept raw so unknown ones can be reported per key.
    pub relationship: String,
    /// Claimed value, cast by the adjudicator to the concept's type.
    pub value: String,
    /// Named parameters narrowing how the concept value is computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<Map<String, Value>>,
}

/// Claims made about one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject identifier.
    pub subject: String,
    /// Combination mode.
    #[serde(default)]
    pub mode: Mode,
    /// The claims.
    pub claims: Vec<Claim>,
}

/// Request body of the validate route: caller key → claim-set.
pub type ClaimsRequest = BTreeMap<String, ClaimSet>;
