//! Builder-style helper for constructing **Markdown prompts**.
//!
//! `PromptBuilder` offers a fluent API that lets you focus on the *content*
//! instead of the syntax. Every method returns `self`, enabling
//! call-chaining:
//!
//! ```rust
//! use vizport_prompt::builder::PromptBuilder;
//!
//! let md = PromptBuilder::new()
//!     .add_section_h2("Available Components")
//!     .add_bullet_labelled("BarChart", "category comparisons")
//!     .add_blank_line()
//!     .add_numbered(1, "Always render a chart.")
//!     .finalize();
//!
//! assert!(md.starts_with("## Available Components"));
//! ```
//!
//! The builder performs no validation and no smart formatting. Newlines and
//! whitespace are emitted exactly as requested.

use std::fmt::{Display, Write as _};

/// Fluent helper to produce markdown fragments.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    buffer: String,
}

impl PromptBuilder {
    /// Create a fresh, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level-1 (`#`) heading.
    pub fn add_section_h1(self, line: impl Display) -> Self {
        self.add_line(format_args!("# {line}"))
    }

    /// Add a level-2 (`##`) heading.
    pub fn add_section_h2(self, line: impl Display) -> Self {
        self.add_line(format_args!("## {line}"))
    }

    /// Add a plain line of text and a trailing newline.
    pub fn add_line(mut self, line: impl Display) -> Self {
        // Writing into a `String` cannot fail.
        let _ = writeln!(self.buffer, "{line}");
        self
    }

    /// Add a bold line (`**text**`).
    pub fn add_line_bold(self, line: impl Display) -> Self {
        self.add_line(format_args!("**{line}**"))
    }

    /// `**Key**: Value`
    pub fn add_key_value(self, key: impl Display, value: impl Display) -> Self {
        self.add_line(format_args!("**{key}**: {value}"))
    }

    /// `- item`
    pub fn add_bullet(self, item: impl Display) -> Self {
        self.add_line(format_args!("- {item}"))
    }

    /// `- **label** - text`
    pub fn add_bullet_labelled(self, label: impl Display, text: impl Display) -> Self {
        self.add_line(format_args!("- **{label}** - {text}"))
    }

    /// `n. item`
    pub fn add_numbered(self, n: usize, item: impl Display) -> Self {
        self.add_line(format_args!("{n}. {item}"))
    }

    /// Embed a code block fenced as `json`.
    pub fn add_text_json(self, content: impl Display) -> Self {
        self.add_line("```json").add_line(content).add_line("```")
    }

    /// Insert a single blank line.
    pub fn add_blank_line(mut self) -> Self {
        self.buffer.push('\n');
        self
    }

    /// Insert a "---" delimiter.
    pub fn add_delimiter(self) -> Self {
        self.add_line("---")
    }

    /// Retrieve the accumulated markdown and consume the builder.
    pub fn finalize(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_lines_verbatim_in_order() {
        let md = PromptBuilder::new()
            .add_section_h1("Title")
            .add_blank_line()
            .add_line_bold("Heads up")
            .add_key_value("Priority", "High")
            .add_bullet("one")
            .add_bullet_labelled("PieChart", "composition of whole")
            .add_numbered(2, "two")
            .add_delimiter()
            .finalize();

        assert_eq!(
            md,
            "# Title\n\n**Heads up**\n**Priority**: High\n- one\n- **PieChart** - composition of whole\n2. two\n---\n"
        );
    }

    #[test]
    fn json_block_is_fenced() {
        let md = PromptBuilder::new().add_text_json("{\"a\":1}").finalize();
        assert_eq!(md, "```json\n{\"a\":1}\n```\n");
    }

    #[test]
    fn empty_builder_yields_empty_string() {
        assert!(PromptBuilder::new().finalize().is_empty());
    }
}
