//! Rule resolution engine
//!
//! Maps a set of active plugins and a theme to Perfmatters exclusion lists
//! using an immutable [`RuleTable`] snapshot. Unknown slugs contribute no
//! rules; the universal entry is applied exactly once. Entries are
//! deduplicated per category in first-seen order: universal rules first, then
//! plugins in request order, then the theme, then any domain-analysis rules.

use crate::rules::{RuleEntry, RuleTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Order-stable, deduplicated exclusion lists for all three categories
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    js_exclusions: Vec<String>,
    delay_js_exclusions: Vec<String>,
    rucss_excluded_stylesheets: Vec<String>,
    seen_js: HashSet<String>,
    seen_delay_js: HashSet<String>,
    seen_rucss: HashSet<String>,
}

impl Exclusions {
    /// Append all entries from a rule entry, skipping duplicates
    pub fn extend_from(&mut self, entry: &RuleEntry) {
        for item in &entry.js_exclusions {
            if self.seen_js.insert(item.clone()) {
                self.js_exclusions.push(item.clone());
            }
        }
        for item in &entry.delay_js_exclusions {
            if self.seen_delay_js.insert(item.clone()) {
                self.delay_js_exclusions.push(item.clone());
            }
        }
        for item in &entry.rucss_excluded_stylesheets {
            if self.seen_rucss.insert(item.clone()) {
                self.rucss_excluded_stylesheets.push(item.clone());
            }
        }
    }

    /// Deduplicated JS exclusions, first-seen order
    pub fn js_exclusions(&self) -> &[String] {
        &self.js_exclusions
    }

    /// Deduplicated delay-JS exclusions, first-seen order
    pub fn delay_js_exclusions(&self) -> &[String] {
        &self.delay_js_exclusions
    }

    /// Deduplicated RUCSS stylesheet exclusions, first-seen order
    pub fn rucss_excluded_stylesheets(&self) -> &[String] {
        &self.rucss_excluded_stylesheets
    }

    /// Build the Perfmatters native import document
    ///
    /// Perfmatters expects each exclusion list as a newline-joined string
    /// under `perfmatters_options.assets`.
    pub fn to_config(&self) -> PerfmattersConfig {
        PerfmattersConfig {
            perfmatters_options: PerfmattersOptions {
                assets: AssetOptions {
                    js_exclusions: self.js_exclusions.join("\n"),
                    delay_js_exclusions: self.delay_js_exclusions.join("\n"),
                    rucss_excluded_stylesheets: self.rucss_excluded_stylesheets.join("\n"),
                },
            },
        }
    }
}

/// Perfmatters native import format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfmattersConfig {
    pub perfmatters_options: PerfmattersOptions,
}

/// `perfmatters_options` section of the import document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfmattersOptions {
    pub assets: AssetOptions,
}

/// Asset exclusion options, newline-joined per Perfmatters' input format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetOptions {
    pub js_exclusions: String,
    pub delay_js_exclusions: String,
    pub rucss_excluded_stylesheets: String,
}

/// Outcome of resolving a plugin set and theme against the rule table
#[derive(Debug)]
pub struct Resolution {
    /// Accumulated exclusions, still extendable by domain analysis
    pub exclusions: Exclusions,
    /// Number of plugins that matched a rule entry
    pub plugins_processed: usize,
    /// Whether the theme matched a rule entry
    pub theme_processed: bool,
}

/// Resolve plugins and a theme against a rule table snapshot
///
/// Unknown slugs are silently ignored. The theme slug is expected to already
/// be the parent theme when the site runs a child theme; the collector
/// performs that substitution before calling the API.
pub fn resolve(table: &RuleTable, plugins: &[String], theme: &str) -> Resolution {
    let mut exclusions = Exclusions::default();
    exclusions.extend_from(&table.universal);

    let mut plugins_processed = 0;
    for slug in plugins {
        if let Some(entry) = table.plugin(slug) {
            exclusions.extend_from(entry);
            plugins_processed += 1;
        }
    }

    let theme_entry = table.theme(theme);
    if let Some(entry) = theme_entry {
        exclusions.extend_from(entry);
    }

    Resolution {
        exclusions,
        plugins_processed,
        theme_processed: theme_entry.is_some(),
    }
}
