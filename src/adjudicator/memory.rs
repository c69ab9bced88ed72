//! In-memory adjudicator for testing and the demo service.
//!
//! Subjects are plain JSON attribute maps. Concepts read one attribute (or
//! test whether the subject exists) and compare it against the claimed value
//! using the concept's declared relationships.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::types::{Claim, ClaimOutcome, ClaimSet, ClaimsRequest, ConceptDescriptor, Mode, Relationship};
use super::{Adjudicator, AdjudicatorError};

/// Value type a concept compares in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptKind {
    /// `true` / `false`; equality relationships only.
    Boolean,
    /// Floating point comparison.
    Number,
    /// Lexicographic comparison.
    String,
}

/// Where a concept's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Whether the subject is known. Qualifiers must match the subject's
    /// attributes of the same name.
    SubjectExists,
    /// A named subject attribute.
    Attribute(String),
}

/// A concept registered with the [`InMemoryAdjudicator`].
#[derive(Debug, Clone)]
pub struct ConceptDefinition {
    descriptor: ConceptDescriptor,
    kind: ConceptKind,
    source: ValueSource,
}

impl ConceptDefinition {
    /// Create a concept reading the attribute of the same name.
    ///
    /// Boolean concepts default to `eq`/`not_eq`; the others accept every
    /// relationship.
    pub fn new(
        kind: ConceptKind,
        name: impl Into<String>,
        description: impl Into<String>,
        long_description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let relationships = match kind {
            ConceptKind::Boolean => vec![Relationship::Eq, Relationship::Ne],
            ConceptKind::Number | ConceptKind::String => Relationship::ALL.to_vec(),
        };
        Self {
            source: ValueSource::Attribute(name.clone()),
            descriptor: ConceptDescriptor {
                name,
                description: description.into(),
                long_description: long_description.into(),
                relationships,
                qualifiers: Vec::new(),
            },
            kind,
        }
    }

    /// Restrict the accepted relationships.
    pub fn with_relationships(mut self, relationships: impl IntoIterator<Item = Relationship>) -> Self {
        self.descriptor.relationships = relationships.into_iter().collect();
        self
    }

    /// Declare qualifier names.
    pub fn with_qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Change where the value is read from.
    pub fn with_source(mut self, source: ValueSource) -> Self {
        self.source = source;
        self
    }

    /// Public descriptor.
    pub fn descriptor(&self) -> &ConceptDescriptor {
        &self.descriptor
    }

    fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// In-memory adjudicator.
///
/// Uses a BTreeMap for subjects so results are deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdjudicator {
    concepts: Vec<ConceptDefinition>,
    subjects: BTreeMap<String, Map<String, Value>>,
}

impl InMemoryAdjudicator {
    /// Create an empty adjudicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo registry used by the `claims_service` binary.
    pub fn demo() -> Self {
        let mut adjudicator = Self::new();

        for (id, age, birth_date, height, color) in [
            ("123456789", 23, "1995-10-23", 5.5, "blue"),
            ("987654321", 16, "2000-07-11", 6.1, "green"),
            ("123456987", 25, "1993-09-10", 5.8, "red"),
        ] {
            adjudicator.add_subject(
                id,
                Map::from_iter([
                    ("age".to_string(), json!(age)),
                    ("birth_date".to_string(), json!(birth_date)),
                    ("height".to_string(), json!(height)),
                    ("favorite_color".to_string(), json!(color)),
                ]),
            );
        }

        adjudicator.add_concept(
            ConceptDefinition::new(
                ConceptKind::Boolean,
                "subject_exists",
                "The subject exists",
                "Determines whether a subject is a known entity within the domain.",
            )
            .with_source(ValueSource::SubjectExists)
            .with_qualifiers(["age"]),
        );
        adjudicator.add_concept(ConceptDefinition::new(
            ConceptKind::Number,
            "age",
            "The subject is of age",
            "Determine if the subject is of an age",
        ));

        adjudicator
    }

    /// Register a concept. A concept with the same name is replaced.
    pub fn add_concept(&mut self, concept: ConceptDefinition) {
        match self.concepts.iter_mut().find(|c| c.name() == concept.name()) {
            Some(existing) => *existing = concept,
            None => self.concepts.push(concept),
        }
    }

    /// Add or replace a subject.
    pub fn add_subject(&mut self, id: impl Into<String>, attributes: Map<String, Value>) {
        self.subjects.insert(id.into(), attributes);
    }

    /// Number of registered concepts.
    pub fn num_concepts(&self) -> usize {
        self.concepts.len()
    }

    /// Number of known subjects.
    pub fn num_subjects(&self) -> usize {
        self.subjects.len()
    }

    fn concept(&self, name: &str) -> Option<&ConceptDefinition> {
        self.concepts.iter().find(|c| c.name() == name)
    }

    /// Adjudicate one claim-set.
    fn evaluate_set(&self, set: &ClaimSet) -> ClaimOutcome {
        let Some(subject) = self.subjects.get(&set.subject) else {
            return ClaimOutcome::SubjectNotFound;
        };

        // Report every malformed claim before evaluating any of them
        let mut diagnostics = Vec::new();
        let mut resolved = Vec::with_capacity(set.claims.len());
        for claim in &set.claims {
            match self.resolve(claim) {
                Ok(pair) => resolved.push((pair, claim)),
                Err(mut errors) => diagnostics.append(&mut errors),
            }
        }
        if !diagnostics.is_empty() {
            return ClaimOutcome::ValidationFailed(diagnostics);
        }

        let mut results = Vec::with_capacity(resolved.len());
        for ((concept, relationship), claim) in resolved {
            match evaluate_claim(concept, relationship, claim, subject) {
                Ok(result) => results.push(result),
                Err(detail) => return ClaimOutcome::InternalFailure(detail),
            }
        }

        let verified = match set.mode {
            Mode::All => results.iter().all(|r| *r),
            Mode::Any => results.iter().any(|r| *r),
        };
        ClaimOutcome::Verified(verified)
    }

    /// Check a claim against the registry.
    fn resolve(&self, claim: &Claim) -> Result<(&ConceptDefinition, Relationship), Vec<String>> {
        let concept = self
            .concept(&claim.concept)
            .ok_or_else(|| vec![format!("Concept {} is not defined", claim.concept)])?;

        let mut errors = Vec::new();
        let relationship = Relationship::from_str(&claim.relationship)
            .filter(|r| concept.descriptor.relationships.contains(r));
        if relationship.is_none() {
            errors.push(format!(
                "Relationship {} is not defined for concept {}",
                claim.relationship,
                concept.name()
            ));
        }

        if let Some(qualifiers) = &claim.qualifier {
            for key in qualifiers.keys() {
                if !concept.descriptor.qualifiers.contains(key) {
                    errors.push(format!(
                        "Qualifier {} is not defined for concept {}",
                        key,
                        concept.name()
                    ));
                }
            }
        }

        match relationship {
            Some(relationship) if errors.is_empty() => Ok((concept, relationship)),
            _ => Err(errors),
        }
    }
}

/// Qualifier equality. Numbers compare by value, so `25` matches `25.0`.
fn same_value(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Evaluate one resolved claim. Errors are internal failures.
fn evaluate_claim(
    concept: &ConceptDefinition,
    relationship: Relationship,
    claim: &Claim,
    subject: &Map<String, Value>,
) -> Result<bool, String> {
    let actual = match &concept.source {
        ValueSource::SubjectExists => {
            let matches = claim
                .qualifier
                .iter()
                .flatten()
                .all(|(key, expected)| subject.get(key).is_some_and(|actual| same_value(actual, expected)));
            Value::Bool(matches)
        }
        ValueSource::Attribute(attribute) => subject
            .get(attribute)
            .cloned()
            .ok_or_else(|| format!("Subject attribute {} is missing", attribute))?,
    };

    let cast_error = |kind: &str| {
        format!(
            "Cannot cast value {:?} to {} for concept {}",
            claim.value,
            kind,
            concept.name()
        )
    };

    let ordering = match concept.kind {
        ConceptKind::Boolean => {
            if relationship.is_ordering() {
                return Err(format!("Relationship {} cannot compare boolean values", relationship));
            }
            let actual = actual.as_bool().ok_or_else(|| cast_error("boolean"))?;
            let claimed: bool = claim.value.parse().map_err(|_| cast_error("boolean"))?;
            Some(actual.cmp(&claimed))
        }
        ConceptKind::Number => {
            let actual = actual.as_f64().ok_or_else(|| cast_error("number"))?;
            let claimed: f64 = claim.value.trim().parse().map_err(|_| cast_error("number"))?;
            actual.partial_cmp(&claimed)
        }
        ConceptKind::String => {
            let actual = actual.as_str().ok_or_else(|| cast_error("string"))?;
            Some(actual.cmp(claim.value.as_str()))
        }
    };

    let ordering = ordering.ok_or_else(|| format!("Values for concept {} are not comparable", concept.name()))?;
    Ok(holds(relationship, ordering))
}

fn holds(relationship: Relationship, ordering: Ordering) -> bool {
    match relationship {
        Relationship::Gt => ordering.is_gt(),
        Relationship::Gte => ordering.is_ge(),
        Relationship::Lt => ordering.is_lt(),
        Relationship::Lte => ordering.is_le(),
        Relationship::Eq => ordering.is_eq(),
        Relationship::Ne => ordering.is_ne(),
    }
}

#[async_trait]
impl Adjudicator for InMemoryAdjudicator {
    fn concepts(&self) -> Vec<ConceptDescriptor> {
        self.concepts.iter().map(|c| c.descriptor.clone()).collect()
    }

    async fn verify_claims(
        &self,
        request: &ClaimsRequest,
    ) -> Result<BTreeMap<String, ClaimOutcome>, AdjudicatorError> {
        Ok(request
            .iter()
            .map(|(key, set)| (key.clone(), self.evaluate_set(set)))
            .collect())
    }
}
