//! Generic message and role types used by the *vizport-core* crate.
//!
//! They mirror the concepts exposed by most chat-style provider APIs
//! (“system”, “user”, “assistant”) and stay provider-agnostic so a backend
//! crate can convert them into its own wire structs via a simple `From`.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A single chat message, independent of any specific provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericMessage {
    pub role: GenericRole,
    pub content: String,
}

impl GenericMessage {
    /// Convenience constructor mirroring the field order used by common HTTP
    /// APIs (`role`, then `content`).
    ///
    /// ```rust
    /// use vizport_core::generic::{GenericMessage, GenericRole};
    ///
    /// let sys = GenericMessage::new(GenericRole::System, "You are a chart designer.");
    /// assert_eq!(sys.role.to_string(), "system");
    /// ```
    pub fn new(role: GenericRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(GenericRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(GenericRole::User, content)
    }
}

/// Chat roles recognised by the generation backends.
///
/// The `Display` implementation renders the canonical lowercase name.
#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenericRole {
    /// Defines global behaviour; carries the deployment's system prompt.
    System,
    /// Messages produced by the model.
    Assistant,
    /// The caller-supplied prompt.
    User,
}

impl Display for GenericRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericRole::System => write!(f, "system"),
            GenericRole::Assistant => write!(f, "assistant"),
            GenericRole::User => write!(f, "user"),
        }
    }
}
