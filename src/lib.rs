//! Perfmatters config generator
//!
//! Maps a WordPress site's active plugins and theme to Perfmatters exclusion
//! lists through a hot-reloadable rule table, optionally enriched by
//! best-effort ad-provider detection on the live site.
//!
//! The crate ships one binary with two modes: `serve` runs the HTTP API and
//! `collect` inspects a WordPress installation via WP-CLI, calls the API, and
//! writes the returned config to a file.
//!
//! # Example
//!
//! ```no_run
//! use perfmatters_gen::{engine, rules::RuleTable};
//!
//! # fn main() -> perfmatters_gen::Result<()> {
//! let table = RuleTable::from_json(r#"{"plugins": {}}"#, "inline")?;
//! let resolution = engine::resolve(&table, &["woocommerce".to_string()], "astra");
//! println!("{} plugins matched", resolution.plugins_processed);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod client;
pub mod collector;
pub mod engine;
pub mod error;
pub mod output;
pub mod rules;
pub mod server;

pub use analyzer::{DomainAnalysis, DomainAnalyzer};
pub use client::ApiClient;
pub use collector::{SiteInspector, SiteProfile, WpCli, collect_profile};
pub use engine::{PerfmattersConfig, Resolution, resolve};
pub use error::{Error, Result};
pub use output::{CollectReport, OutputFormat, output_report};
pub use rules::{RuleEntry, RuleTable};
pub use server::{AppState, GenerateRequest, GenerateResponse, ProcessingInfo};
