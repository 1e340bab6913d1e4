//! Model identifiers used throughout the **vizport** workspace.
//!
//! Known hosted models get an enum variant so application code never spells
//! out identifiers such as `"c1/anthropic/claude-sonnet-4/v-20250815"`; the
//! backend crate maps the variant onto its own naming scheme.
//! Anything else (a newer model version, a self-hosted endpoint) travels as
//! [`Model::Custom`].
//!
//! ```rust
//! use vizport_core::model::{C1Model, Model};
//! assert_eq!(Model::from(C1Model::ClaudeSonnet4), Model::C1(C1Model::ClaudeSonnet4));
//! assert_eq!(Model::parse("c1/anthropic/claude-sonnet-4/v-20250815"),
//!            Model::C1(C1Model::ClaudeSonnet4));
//! ```

use std::fmt::Display;

/// Universal identifier for a generation model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// Generative-UI models served by the Thesys C1 endpoint.
    C1(C1Model),
    /// Fully qualified model id passed through verbatim.
    Custom(String),
}

/// Models officially supported by the C1 endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum C1Model {
    ClaudeSonnet4,
}

impl C1Model {
    pub const ALL: [C1Model; 1] = [C1Model::ClaudeSonnet4];

    /// Wire identifier understood by the hosted endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            C1Model::ClaudeSonnet4 => "c1/anthropic/claude-sonnet-4/v-20250815",
        }
    }
}

impl Model {
    /// Resolve a configured model string, preferring a known variant.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        C1Model::ALL
            .into_iter()
            .find(|known| known.as_str() == value)
            .map(Model::C1)
            .unwrap_or_else(|| Model::Custom(value.to_owned()))
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::C1(C1Model::ClaudeSonnet4)
    }
}

impl From<C1Model> for Model {
    fn from(val: C1Model) -> Self {
        Model::C1(val)
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::C1(model) => f.write_str(model.as_str()),
            Model::Custom(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_stay_custom() {
        assert_eq!(
            Model::parse(" c1/openai/gpt-5/v-20251130 "),
            Model::Custom("c1/openai/gpt-5/v-20251130".into())
        );
    }

    #[test]
    fn display_renders_wire_identifier() {
        assert_eq!(
            Model::default().to_string(),
            "c1/anthropic/claude-sonnet-4/v-20250815"
        );
    }
}
