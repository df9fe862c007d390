//! Rule table loading and validation
//!
//! The rule file maps plugin and theme slugs to Perfmatters exclusion lists.
//! It is loaded once at startup and can be hot-reloaded; the server swaps the
//! whole table atomically so requests always see a complete table.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Exclusion lists for a single plugin, theme, or the universal entry
///
/// Categories mirror the Perfmatters asset options they feed into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Scripts excluded from JS optimization
    #[serde(default)]
    pub js_exclusions: Vec<String>,
    /// Scripts excluded from delayed JS execution
    #[serde(default)]
    pub delay_js_exclusions: Vec<String>,
    /// Stylesheets excluded from Remove Unused CSS
    #[serde(default)]
    pub rucss_excluded_stylesheets: Vec<String>,
}

impl RuleEntry {
    /// True if every category is empty
    pub fn is_empty(&self) -> bool {
        self.js_exclusions.is_empty()
            && self.delay_js_exclusions.is_empty()
            && self.rucss_excluded_stylesheets.is_empty()
    }
}

/// The full rule table: universal entry plus per-plugin and per-theme entries
///
/// Matching is exact-string on the slug; a slug maps to at most one entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTable {
    /// Rules applied to every request, exactly once
    #[serde(default)]
    pub universal: RuleEntry,
    /// Rules keyed by plugin slug
    #[serde(default)]
    pub plugins: HashMap<String, RuleEntry>,
    /// Rules keyed by (parent) theme slug
    #[serde(default)]
    pub themes: HashMap<String, RuleEntry>,
}

impl RuleTable {
    /// Parse a rule table from a JSON string
    pub fn from_json(json: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::RuleFileInvalid {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load and validate a rule table from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let display_path = path.display().to_string();
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::RuleFileRead {
                path: display_path.clone(),
                source: e,
            })?;
        let table = Self::from_json(&data, &display_path)?;
        tracing::info!(
            path = %display_path,
            plugins = table.plugins.len(),
            themes = table.themes.len(),
            "rule table loaded"
        );
        Ok(table)
    }

    /// Look up the entry for a plugin slug
    pub fn plugin(&self, slug: &str) -> Option<&RuleEntry> {
        self.plugins.get(slug)
    }

    /// Look up the entry for a theme slug
    pub fn theme(&self, slug: &str) -> Option<&RuleEntry> {
        self.themes.get(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_table() {
        let json = r#"{
            "universal": {
                "js_exclusions": ["jquery.min.js"],
                "delay_js_exclusions": ["jquery"],
                "rucss_excluded_stylesheets": []
            },
            "plugins": {
                "woocommerce": {
                    "js_exclusions": ["woocommerce.min.js"],
                    "delay_js_exclusions": ["wc-"],
                    "rucss_excluded_stylesheets": ["woocommerce.css"]
                }
            },
            "themes": {
                "astra": {
                    "js_exclusions": ["astra.js"],
                    "delay_js_exclusions": [],
                    "rucss_excluded_stylesheets": ["astra.css"]
                }
            }
        }"#;

        let table = RuleTable::from_json(json, "test").unwrap();
        assert_eq!(table.universal.js_exclusions, vec!["jquery.min.js"]);
        assert!(table.plugin("woocommerce").is_some());
        assert!(table.plugin("unknown-plugin").is_none());
        assert!(table.theme("astra").is_some());
    }

    #[test]
    fn missing_categories_default_to_empty() {
        let json = r#"{
            "plugins": {
                "contact-form-7": { "js_exclusions": ["wpcf7"] }
            }
        }"#;

        let table = RuleTable::from_json(json, "test").unwrap();
        let entry = table.plugin("contact-form-7").unwrap();
        assert_eq!(entry.js_exclusions, vec!["wpcf7"]);
        assert!(entry.delay_js_exclusions.is_empty());
        assert!(entry.rucss_excluded_stylesheets.is_empty());
        assert!(table.universal.is_empty());
    }

    #[test]
    fn reject_wrong_category_type() {
        // js_exclusions must be an array of strings, not a string
        let json = r#"{
            "plugins": {
                "woocommerce": { "js_exclusions": "woocommerce.min.js" }
            }
        }"#;

        let result = RuleTable::from_json(json, "test");
        assert!(result.is_err());
    }

    #[test]
    fn reject_unknown_top_level_key() {
        let json = r#"{ "pluginz": {} }"#;
        assert!(RuleTable::from_json(json, "test").is_err());
    }

    #[test]
    fn reject_invalid_json() {
        let result = RuleTable::from_json("{not json", "test");
        assert!(matches!(result, Err(Error::RuleFileInvalid { .. })));
    }
}
