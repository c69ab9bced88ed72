//! Concept descriptors and relationships.

use serde::{Deserialize, Serialize};

/// Comparison a claim applies between a concept's value and the claimed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// Strictly greater than.
    #[serde(rename = "gt")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = "gt_or_eq")]
    Gte,
    /// Strictly less than.
    #[serde(rename = "lt")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "lt_or_eq")]
    Lte,
    /// Equal.
    #[serde(rename = "eq")]
    Eq,
    /// Not equal.
    #[serde(rename = "not_eq")]
    Ne,
}

impl Relationship {
    /// Every relationship, in canonical order.
    pub const ALL: [Relationship; 6] = [Self::Gt, Self::Gte, Self::Lt, Self::Lte, Self::Eq, Self::Ne];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gt_or_eq",
            Self::Lt => "lt",
            Self::Lte => "lt_or_eq",
            Self::Eq => "eq",
            Self::Ne => "not_eq",
        }
    }

    /// Parse a wire identifier.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Whether the relationship needs an ordering rather than equality.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only description of a concept, as exposed by the list route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDescriptor {
    /// Concept identifier used in claims.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Long description.
    #[serde(rename = "longDescription")]
    pub long_description: String,
    /// Relationships claims may use with this concept.
    pub relationships: Vec<Relationship>,
    /// Qualifier names claims may pass, in declaration order.
    #[serde(default)]
    pub qualifiers: Vec<String>,
}
