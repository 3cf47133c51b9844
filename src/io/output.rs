use crate::core::{AnalysisResult, Priority};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "terminal" => Some(OutputFormat::Terminal),
            _ => None,
        }
    }
}

pub trait OutputWriter {
    fn write_results(&mut self, results: &[AnalysisResult]) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    /// A single result is written as an object, several as an array.
    fn write_results(&mut self, results: &[AnalysisResult]) -> anyhow::Result<()> {
        let json = match results {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        writeln!(self.writer, "{json}")?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(self.writer, "## {}", title(result))?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Generated: {}",
            result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", result.summary)?;
        writeln!(self.writer)?;

        if !result.insights.is_empty() {
            writeln!(self.writer, "### Insights")?;
            writeln!(self.writer)?;
            for insight in &result.insights {
                writeln!(self.writer, "- {insight}")?;
            }
            writeln!(self.writer)?;
        }

        if !result.recommendations.is_empty() {
            writeln!(self.writer, "### Recommendations")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Priority | Category | Recommendation | Effort |")?;
            writeln!(self.writer, "|----------|----------|----------------|--------|")?;
            for rec in &result.recommendations {
                writeln!(
                    self.writer,
                    "| {} | {} | {} | {} |",
                    rec.priority,
                    rec.category,
                    rec.description.replace('|', "\\|"),
                    rec.estimated_effort
                )?;
            }
            writeln!(self.writer)?;
        }

        if !result.warnings.is_empty() {
            writeln!(self.writer, "### Warnings ({})", result.warnings.len())?;
            writeln!(self.writer)?;
            for warning in &result.warnings {
                writeln!(self.writer, "- {warning}")?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_results(&mut self, results: &[AnalysisResult]) -> anyhow::Result<()> {
        writeln!(self.writer, "# Reposcope Analysis Report")?;
        writeln!(self.writer)?;
        for result in results {
            self.write_result(result)?;
        }
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl TerminalWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: std::io::stdout(),
        }
    }
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let title = title(result);
        writeln!(self.writer, "{}", title.bold().blue())?;
        writeln!(self.writer, "{}", "=".repeat(title.len()).blue())?;
        writeln!(self.writer, "{}", result.summary)?;
        writeln!(self.writer)?;

        for insight in &result.insights {
            writeln!(self.writer, "  {} {}", "•".cyan(), insight)?;
        }
        if !result.insights.is_empty() {
            writeln!(self.writer)?;
        }

        if result.recommendations.is_empty() {
            writeln!(self.writer, "{}", "No recommendations".green())?;
        } else {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Priority", "Category", "Recommendation", "Effort"]);
            for rec in &result.recommendations {
                table.add_row(vec![
                    Cell::new(rec.priority.to_string()).fg(priority_color(rec.priority)),
                    Cell::new(&rec.category),
                    Cell::new(&rec.description),
                    Cell::new(&rec.estimated_effort),
                ]);
            }
            writeln!(self.writer, "{table}")?;
        }

        if !result.warnings.is_empty() {
            writeln!(
                self.writer,
                "{}",
                format!("{} warnings:", result.warnings.len()).yellow()
            )?;
            for warning in &result.warnings {
                writeln!(self.writer, "  {} {}", "!".yellow(), warning)?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_results(&mut self, results: &[AnalysisResult]) -> anyhow::Result<()> {
        for result in results {
            self.write_result(result)?;
        }
        Ok(())
    }
}

fn title(result: &AnalysisResult) -> String {
    let kind = result.kind().as_str().replace('-', " ");
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => format!("{}{} Analysis", first.to_ascii_uppercase(), chars.as_str()),
        None => "Analysis".to_string(),
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Critical => Color::Red,
        Priority::High => Color::Yellow,
        Priority::Medium => Color::Cyan,
        Priority::Low => Color::Green,
    }
}

pub fn create_writer(format: OutputFormat, sink: Box<dyn Write>) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(sink)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(sink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::migration::{MigrationEffort, MigrationPlan};
    use crate::core::{AnalysisData, ParseWarning, Recommendation, ResultBuilder};

    fn sample() -> AnalysisResult {
        let plan = MigrationPlan {
            migration_type: "vue2-to-vue3".into(),
            source_framework: "Vue 2".into(),
            target_framework: "Vue 3".into(),
            files_to_change: Vec::new(),
            estimated_effort: MigrationEffort::Low,
            breaking_changes: Vec::new(),
            steps: Vec::new(),
        };
        ResultBuilder::new(AnalysisData::Migration(plan))
            .summary("Nothing to migrate")
            .insights(vec!["No Vue 2 code found".into()])
            .recommendations(vec![Recommendation::new(
                "migration",
                Priority::High,
                "Upgrade a | b",
                "1 day",
            )])
            .warnings(vec![ParseWarning::new("walker", "loop")])
            .build()
    }

    #[test]
    fn test_json_single_result_is_an_object() {
        let mut buf = Vec::new();
        JsonWriter::new(&mut buf).write_results(&[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["data"]["type"], "migration");

        let mut buf = Vec::new();
        JsonWriter::new(&mut buf).write_results(&[sample(), sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_markdown_sections() {
        let mut buf = Vec::new();
        MarkdownWriter::new(&mut buf).write_results(&[sample()]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("# Reposcope Analysis Report"));
        assert!(text.contains("## Migration Analysis"));
        assert!(text.contains("| high | migration | Upgrade a \\| b | 1 day |"));
        assert!(text.contains("### Warnings (1)"));
    }

    #[test]
    fn test_terminal_renders_table() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        TerminalWriter::new(&mut buf).write_results(&[sample()]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Migration Analysis"));
        assert!(text.contains("Recommendation"));
        assert!(text.contains("1 warnings:"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("xml"), None);
    }
}
