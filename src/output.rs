use crate::flatten::display_labels;
use crate::models::SlateReport;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format options
#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print slate reports in the specified format
pub fn print_results(reports: &[SlateReport], format: OutputFormat) {
    match format {
        OutputFormat::Plain => print!("{}", render_plain(reports)),
        OutputFormat::Json => print_json(reports),
    }
}

/// Render reports as labelled plain text
fn render_plain(reports: &[SlateReport]) -> String {
    let labels = display_labels();
    let mut out = String::new();

    for (i, report) in reports.iter().enumerate() {
        out.push_str(&format!("=== Slate {}: {} ===\n\n", i + 1, report.title));

        for (label, value) in labels.iter().zip(report.values.values()) {
            if label.ends_with("Average Rating") {
                out.push('\n');
            }
            out.push_str(&format!("{:<40} {}\n", label, format_value(value)));
        }
        out.push('\n');

        if i + 1 < reports.len() {
            out.push_str(&"=".repeat(50));
            out.push_str("\n\n");
        }
    }

    out
}

/// Strings unquoted, numbers as written, null as a dash
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Print results in JSON format
fn print_json(reports: &[SlateReport]) {
    match serde_json::to_string_pretty(reports) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results to JSON: {}", e),
    }
}
