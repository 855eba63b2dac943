//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::composer::ConfigView;

const REDACTED: &str = "******";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Serialize)]
struct PropertyRow<'a> {
    key: &'a str,
    value: &'a str,
    source: &'a str,
}

/// Renders serializable data as JSON or YAML.
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
        OutputFormat::Table => {
            anyhow::bail!("Table format requires custom implementation per data type")
        }
    }
}

/// Renders the merged properties of `view` with the source each one comes from.
pub fn render_view(view: &ConfigView, show_values: bool, format: OutputFormat) -> Result<String> {
    let merged: BTreeMap<String, String> = view.merged();
    let rows: Vec<PropertyRow<'_>> = merged
        .iter()
        .map(|(key, value)| PropertyRow {
            key: key.as_str(),
            value: if show_values { value.as_str() } else { REDACTED },
            source: view.origin(key).unwrap_or_default(),
        })
        .collect();

    if format != OutputFormat::Table {
        return render(&rows, format);
    }

    let key_width = rows.iter().map(|row| row.key.len()).max().unwrap_or(0).max(3);
    let value_width = rows.iter().map(|row| row.value.len()).max().unwrap_or(0).max(5);

    let mut out = format!("{:<key_width$}  {:<value_width$}  SOURCE\n", "KEY", "VALUE");
    for row in &rows {
        out.push_str(&format!("{:<key_width$}  {:<value_width$}  {}\n", row.key, row.value, row.source));
    }
    out.push_str(&format!(
        "\n{} properties from {} sources (composed at {})\n",
        rows.len(),
        view.len(),
        view.composed_at().to_rfc3339()
    ));
    Ok(out)
}
