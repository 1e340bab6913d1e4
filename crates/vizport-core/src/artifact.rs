//! Artifact records and their identifiers.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Result, VizportError};

const MAX_ID_LEN: usize = 256;

/// Opaque handle of a stored artifact.
///
/// Generated ids look like `viz_01J9Z3Q4X8M6V5T2R1P0N9K8J7`. Lookups accept any
/// non-empty string so a fabricated reference resolves to "not found" rather
/// than "malformed".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub const PREFIX: &'static str = "viz_";

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("{}{ulid}", Self::PREFIX))
    }

    /// Parse a reference received from a caller for lookup.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(VizportError::invalid("Reference is required"));
        }
        if value.len() > MAX_ID_LEN {
            return Err(VizportError::invalid(format!(
                "reference exceeds {MAX_ID_LEN} bytes"
            )));
        }
        Ok(Self(value.to_owned()))
    }

    /// Parse an id the caller wants a new artifact stored under. Such ids end
    /// up in retrieval URLs, so only `[A-Za-z0-9_-]` is accepted.
    pub fn parse_custom(value: &str) -> Result<Self> {
        let id = Self::parse(value)?;
        if !id
            .0
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(VizportError::invalid(
                "custom ids may only contain ASCII letters, digits, `_` and `-`",
            ));
        }
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = VizportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An immutable generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    /// Generated content. Never parsed or validated by the store.
    pub payload: String,
    pub created_at: DateTime<Utc>,
    /// The user prompt that produced `payload`, kept for auditing.
    pub source_prompt: String,
}

/// Input of [`ArtifactStore::put`](crate::store::ArtifactStore::put).
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub payload: String,
    pub source_prompt: String,
    /// Store under this id instead of a generated one.
    pub id: Option<ArtifactId>,
}

impl NewArtifact {
    pub fn new(payload: impl Into<String>, source_prompt: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            source_prompt: source_prompt.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: ArtifactId) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn fabricated_references_are_valid_lookup_keys() {
        let id = ArtifactId::parse("viz_0_zzzzzzzzz").unwrap();
        assert_eq!(id.as_str(), "viz_0_zzzzzzzzz");
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::newline("\n\t")]
    fn blank_references_are_rejected(#[case] value: &str) {
        assert!(matches!(
            ArtifactId::parse(value),
            Err(VizportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn overlong_references_are_rejected() {
        let value = "a".repeat(MAX_ID_LEN + 1);
        assert!(ArtifactId::parse(&value).is_err());
    }

    #[rstest]
    #[case::slash("session/1")]
    #[case::space("my session")]
    #[case::query("a?b=c")]
    fn custom_ids_must_be_url_safe(#[case] value: &str) {
        assert!(ArtifactId::parse_custom(value).is_err());
    }

    #[test]
    fn custom_ids_keep_their_spelling() {
        let id = ArtifactId::parse_custom("session_1700000000_abc-def").unwrap();
        assert_eq!(id.to_string(), "session_1700000000_abc-def");
    }

    #[test]
    fn generated_ids_carry_the_prefix() {
        let id = ArtifactId::from_ulid(Ulid::nil());
        assert_eq!(id.as_str(), "viz_00000000000000000000000000");
    }
}
