// Entity recognizer trait and the span types it produces.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

/// The entity type attached to a span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    Misc,
    Other(String),
}

impl EntityLabel {
    /// Map a BIO tag suffix (`PER`, `ORG`, ...) to a label.
    pub fn from_tag_kind(kind: &str) -> Self {
        match kind {
            "PER" | "PERSON" => Self::Person,
            "ORG" => Self::Organization,
            "LOC" | "GPE" => Self::Location,
            "MISC" => Self::Misc,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => f.write_str("PERSON"),
            Self::Organization => f.write_str("ORG"),
            Self::Location => f.write_str("LOC"),
            Self::Misc => f.write_str("MISC"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// A labeled run of text found by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }

    pub fn is_person(&self) -> bool {
        self.label == EntityLabel::Person
    }
}

/// Trait for extracting labeled entity spans from plain text.
///
/// Implementations must be deterministic for a given model version. Spans
/// come back in the order they occur in the text.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}
