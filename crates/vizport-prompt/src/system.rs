//! The default system prompt sent ahead of every visualization request.

use std::fmt;

use crate::builder::PromptBuilder;

/// A renderable component the model may emit, with a one-line hint on when
/// to pick it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub guidance: String,
}

impl Component {
    pub fn new(name: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guidance: guidance.into(),
        }
    }
}

/// Structured form of the visualization system prompt.
///
/// [`Default`] yields the stock catalog of chart and display components.
/// Deployments that want different wording either edit the catalog or skip
/// this type and hand the gateway a prompt file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationPrompt {
    pub persona: String,
    pub charts: Vec<Component>,
    pub displays: Vec<Component>,
    pub rules: Vec<String>,
    pub closing: String,
}

impl Default for VisualizationPrompt {
    fn default() -> Self {
        Self {
            persona: "You are an expert data visualization specialist with deep knowledge of \
                      data analysis and chart creation. Your task is to create beautiful, \
                      interactive visualizations that help users understand their data better."
                .into(),
            charts: vec![
                Component::new("LineChart", "Trends over time, correlations, fluctuations"),
                Component::new("AreaChart", "Volume/magnitude of change, cumulative values"),
                Component::new("BarChart", "Category comparisons, ranking, value differences"),
                Component::new("PieChart", "Composition of whole, percentage breakdowns"),
                Component::new("RadarChart", "Multi-variable comparisons, performance evaluation"),
                Component::new("RadialChart", "Progress indicators, goal tracking"),
            ],
            displays: vec![
                Component::new("TextContent", "Formatted text with markdown support"),
                Component::new("Callout", "Highlighting important information"),
                Component::new("Table", "Structured data display"),
                Component::new("ListBlock", "Interactive lists"),
                Component::new("Accordion", "Organized content sections"),
                Component::new("Steps", "Sequential processes"),
                Component::new("CodeBlock", "Code examples"),
            ],
            rules: vec![
                "ALWAYS use the appropriate chart component (LineChart, BarChart, PieChart, etc.)"
                    .into(),
                "Provide comprehensive data analysis and insights".into(),
                "Use TextContent for explanations and analysis".into(),
                "Use Callout for highlighting key insights".into(),
                "Use Table for data summaries when appropriate".into(),
            ],
            closing: "Always create actual visualizations, not just text descriptions. \
                      Use the chart components to display data visually."
                .into(),
        }
    }
}

impl VisualizationPrompt {
    pub fn with_chart(mut self, component: Component) -> Self {
        self.charts.push(component);
        self
    }

    pub fn with_display(mut self, component: Component) -> Self {
        self.displays.push(component);
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Render as markdown.
    pub fn render(&self) -> String {
        let mut builder = PromptBuilder::new()
            .add_line(&self.persona)
            .add_blank_line()
            .add_section_h2("Available Visualization Components:");
        for chart in &self.charts {
            builder = builder.add_bullet_labelled(&chart.name, &chart.guidance);
        }

        builder = builder.add_blank_line().add_section_h2("Display Components:");
        for display in &self.displays {
            builder = builder.add_bullet_labelled(&display.name, &display.guidance);
        }

        if !self.rules.is_empty() {
            builder = builder
                .add_blank_line()
                .add_section_h2("CRITICAL: When creating data visualizations:");
            for (n, rule) in self.rules.iter().enumerate() {
                builder = builder.add_numbered(n + 1, rule);
            }
        }

        if !self.charts.is_empty() {
            builder = builder
                .add_blank_line()
                .add_section_h2("Chart Selection Guidelines:");
            for chart in &self.charts {
                builder = builder.add_bullet(format_args!("**{}**: {}", chart.name, chart.guidance));
            }
        }

        if !self.closing.is_empty() {
            builder = builder
                .add_blank_line()
                .add_section_h2(format_args!("IMPORTANT: {}", self.closing));
        }

        builder.finalize()
    }
}

impl fmt::Display for VisualizationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// The stock system prompt.
pub fn default_system_prompt() -> String {
    VisualizationPrompt::default().render()
}
