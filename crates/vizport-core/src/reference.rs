//! Reference styles and retrieval links.
//!
//! A *stored* reference is an [`ArtifactId`] resolved out of band through an
//! [`ArtifactStore`](crate::store::ArtifactStore). A *self-describing*
//! reference is the percent-encoded payload itself: no lookup, but the
//! retrieval URL grows with the payload and breaks once it exceeds what the
//! transport accepts.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::{
    artifact::ArtifactId,
    error::{Result, VizportError},
};

/// Conservative bound for a whole retrieval URL; common proxies and servers
/// reject request lines beyond 8 KiB.
pub const DEFAULT_MAX_REFERENCE_LEN: usize = 8 * 1024;

/// Escape everything except unreserved characters and `!*'()`, the usual
/// URI component set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStyle {
    /// Short id, payload kept in a store.
    Stored,
    /// Payload carried in the reference itself.
    Inline,
}

/// Encode `payload` into a self-describing reference.
pub fn encode_inline(payload: &str) -> String {
    utf8_percent_encode(payload, COMPONENT).to_string()
}

/// Recover the payload from a self-describing reference.
pub fn decode_inline(reference: &str) -> Result<String> {
    percent_decode_str(reference)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|err| VizportError::invalid(format!("reference is not valid UTF-8: {err}")))
}

/// Builds the URLs handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalLinks {
    base_url: String,
}

impl RetrievalLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Page that looks the artifact up by id.
    pub fn stored(&self, id: &ArtifactId) -> String {
        format!(
            "{}/visualization/{}",
            self.base_url,
            utf8_percent_encode(id.as_str(), COMPONENT)
        )
    }

    /// Page that decodes an already-encoded inline reference.
    pub fn inline(&self, encoded: &str) -> String {
        format!("{}/viz?data={encoded}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_matches_encode_uri_component() {
        assert_eq!(
            encode_inline("Q1 45K & Q2 (52K)! ~ok* 'x' ü/?"),
            "Q1%2045K%20%26%20Q2%20(52K)!%20~ok*%20'x'%20%C3%BC%2F%3F"
        );
    }

    #[test]
    fn decode_recovers_the_payload() {
        let payload = "<Chart data=\"[1,2,3]\">\n  naïve – text\n</Chart>";
        assert_eq!(decode_inline(&encode_inline(payload)).unwrap(), payload);
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_inline("%FF%FE"),
            Err(VizportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn links_trim_trailing_slashes() {
        let links = RetrievalLinks::new("https://adi.example.com//");
        let id = ArtifactId::parse("viz_01ABC").unwrap();

        assert_eq!(links.stored(&id), "https://adi.example.com/visualization/viz_01ABC");
        assert_eq!(links.inline("a%20b"), "https://adi.example.com/viz?data=a%20b");
    }
}
