//! Output formatters for different output modes

use serde::Serialize;
use strum::VariantNames;
use strum_macros::{Display, EnumString};

use crate::output::colors::{ansi, paint};
use crate::xpath::Match;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, strum_macros::VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    /// XML of matched nodes
    Xml,
    /// Text content of matched node
    Text,
    /// Number of matches
    Count,
    /// JSON array with match details
    Json,
    /// Absolute location path of each match
    Paths,
}

impl OutputFormat {
    /// Get list of all valid format names
    pub fn valid_formats() -> &'static [&'static str] {
        Self::VARIANTS
    }
}

/// Options for output formatting
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Whether to use color in output
    pub use_color: bool,
    /// Prefix every line with the file name
    pub with_filename: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct JsonMatch<'a> {
    file: &'a str,
    path: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    xml: Option<&'a str>,
}

/// Format matches according to the specified format
pub fn format_matches(matches: &[Match], format: OutputFormat, options: &OutputOptions) -> String {
    match format {
        OutputFormat::Xml => format_xml(matches, options),
        OutputFormat::Text => format_lines(matches, options, |m| &m.value),
        OutputFormat::Count => format_count(matches),
        OutputFormat::Json => format_json(matches),
        OutputFormat::Paths => format_lines(matches, options, |m| &m.path),
    }
}

fn prefix(m: &Match, options: &OutputOptions) -> String {
    if !options.with_filename {
        return String::new();
    }
    format!("{}:", paint(&m.file, ansi::GRAY, options.use_color))
}

fn format_xml(matches: &[Match], options: &OutputOptions) -> String {
    let mut output = String::new();
    for m in matches {
        output.push_str(&prefix(m, options));
        // Attribute values and other non-node results have no fragment
        let xml = m.xml_fragment.as_deref().unwrap_or(&m.value);
        output.push_str(&paint(xml, ansi::CYAN, options.use_color));
        output.push('\n');
    }
    output
}

fn format_lines(matches: &[Match], options: &OutputOptions, field: fn(&Match) -> &String) -> String {
    let mut output = String::new();
    for m in matches {
        output.push_str(&prefix(m, options));
        output.push_str(field(m));
        output.push('\n');
    }
    output
}

fn format_json(matches: &[Match]) -> String {
    let json_matches: Vec<JsonMatch> = matches
        .iter()
        .map(|m| JsonMatch {
            file: &m.file,
            path: &m.path,
            value: &m.value,
            xml: m.xml_fragment.as_deref(),
        })
        .collect();

    let mut output = serde_json::to_string_pretty(&json_matches).unwrap_or_else(|_| "[]".to_string());
    output.push('\n');
    output
}

fn format_count(matches: &[Match]) -> String {
    format!("{}\n", matches.len())
}
