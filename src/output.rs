//! Output formatting for collect results

use crate::error::{Error, Result};
use crate::server::ProcessingInfo;
use comfy_table::{
    Attribute, Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL,
};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table output
    #[default]
    Human,
    /// JSON output
    Json,
    /// No output (silent mode)
    None,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            _ => Err(Error::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Summary of one collect run
#[derive(Debug, Clone, Serialize)]
pub struct CollectReport {
    /// Canonical site URL
    pub site_url: String,
    /// Theme submitted to the API (parent theme for child themes)
    pub theme: String,
    /// Child theme slug when the site runs one
    pub child_theme: Option<String>,
    /// Active plugin slugs submitted to the API
    pub plugins: Vec<String>,
    /// Match counts reported by the API
    pub processing_info: ProcessingInfo,
    /// Ad providers found by domain analysis
    pub detected_ad_providers: Vec<String>,
    /// Non-fatal domain analysis failure, if any
    pub analysis_warning: Option<String>,
    /// Generation timestamp reported by the API
    pub generated_at: String,
    /// File the config was written to
    pub output_file: String,
}

/// Output the collect report
pub fn output_report<W: Write>(
    report: &CollectReport,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Human => output_human(report, writer),
        OutputFormat::Json => output_json(report, writer),
        OutputFormat::None => Ok(()),
    }
}

/// Output JSON format
fn output_json<W: Write>(report: &CollectReport, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer).map_err(Error::OutputFailed)?;
    Ok(())
}

/// Output human-readable table format
fn output_human<W: Write>(report: &CollectReport, writer: &mut W) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Sent as").add_attribute(Attribute::Bold),
        ]);

    let theme_name = match &report.child_theme {
        Some(child) => child.clone(),
        None => report.theme.clone(),
    };
    table.add_row(vec![
        Cell::new("Theme"),
        Cell::new(&theme_name),
        Cell::new(&report.theme).set_alignment(CellAlignment::Left),
    ]);

    if report.plugins.is_empty() {
        table.add_row(vec![Cell::new("Plugin"), Cell::new("-"), Cell::new("-")]);
    } else {
        let mut plugins = report.plugins.clone();
        plugins.sort();
        for plugin in &plugins {
            table.add_row(vec![
                Cell::new("Plugin"),
                Cell::new(plugin),
                Cell::new(plugin),
            ]);
        }
    }

    writeln!(writer, "{}", table).map_err(Error::OutputFailed)?;

    writeln!(
        writer,
        "Plugins matched: {}/{}",
        report.processing_info.plugins_processed,
        report.plugins.len()
    )
    .map_err(Error::OutputFailed)?;
    writeln!(
        writer,
        "Theme matched:   {}",
        if report.processing_info.theme_processed {
            "yes"
        } else {
            "no"
        }
    )
    .map_err(Error::OutputFailed)?;

    if !report.detected_ad_providers.is_empty() {
        writeln!(
            writer,
            "Ad providers:    {}",
            report.detected_ad_providers.join(", ")
        )
        .map_err(Error::OutputFailed)?;
    }
    if let Some(warning) = &report.analysis_warning {
        writeln!(writer, "Warning:         {}", warning).map_err(Error::OutputFailed)?;
    }

    writeln!(writer, "Config written:  {}", report.output_file).map_err(Error::OutputFailed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> CollectReport {
        CollectReport {
            site_url: "https://example.com".to_string(),
            theme: "astra".to_string(),
            child_theme: Some("astra-child".to_string()),
            plugins: vec!["woocommerce".to_string(), "elementor".to_string()],
            processing_info: ProcessingInfo {
                plugins_processed: 2,
                theme_processed: true,
            },
            detected_ad_providers: vec!["Mediavine".to_string()],
            analysis_warning: None,
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            output_file: "perfmatters-config.json".to_string(),
        }
    }

    #[test]
    fn parse_output_format() {
        assert_eq!(OutputFormat::from_str("human").unwrap(), OutputFormat::Human);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("table").is_err());
    }

    #[test]
    fn human_output_contains_summary() {
        let mut out = Vec::new();
        output_report(&sample_report(), OutputFormat::Human, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("astra-child"));
        assert!(text.contains("woocommerce"));
        assert!(text.contains("Plugins matched: 2/2"));
        assert!(text.contains("Mediavine"));
        assert!(text.contains("perfmatters-config.json"));
    }

    #[test]
    fn json_output_round_trips() {
        let mut out = Vec::new();
        output_report(&sample_report(), OutputFormat::Json, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["theme"], "astra");
        assert_eq!(value["child_theme"], "astra-child");
        assert_eq!(value["processing_info"]["plugins_processed"], 2);
    }

    #[test]
    fn none_output_is_silent() {
        let mut out = Vec::new();
        output_report(&sample_report(), OutputFormat::None, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
