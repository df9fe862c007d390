//! WordPress site inspection via WP-CLI
//!
//! The generator API only needs four facts about a site: its active plugins,
//! its active theme, that theme's parent (if it is a child theme), and the
//! site URL. [`SiteInspector`] keeps that contract narrow so the collector and
//! its tests never depend on a real `wp` process.

use crate::error::{Error, Result};
use std::path::PathBuf;
use tokio::process::Command;

/// Read-only view of a WordPress installation
#[allow(async_fn_in_trait)]
pub trait SiteInspector {
    /// Slugs of all active plugins
    async fn active_plugins(&self) -> Result<Vec<String>>;

    /// Slug of the active theme (the child theme when one is active)
    async fn active_theme(&self) -> Result<String>;

    /// Parent theme slug, or `None` when the theme is not a child theme
    async fn theme_parent(&self, slug: &str) -> Result<Option<String>>;

    /// Canonical site URL
    async fn site_url(&self) -> Result<String>;
}

/// What the collector submits to the generator API
///
/// Optimization rules are written for parent themes, so `theme` is always the
/// parent when the site runs a child theme; the child slug is kept for
/// reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub plugins: Vec<String>,
    pub theme: String,
    pub child_theme: Option<String>,
    pub site_url: String,
}

/// Gather a site profile through an inspector
pub async fn collect_profile<I: SiteInspector>(inspector: &I) -> Result<SiteProfile> {
    let plugins = inspector.active_plugins().await?;
    let active_theme = inspector.active_theme().await?;
    let site_url = inspector.site_url().await?;

    let (theme, child_theme) = match inspector.theme_parent(&active_theme).await? {
        Some(parent) => (parent, Some(active_theme)),
        None => (active_theme, None),
    };

    tracing::debug!(
        plugins = plugins.len(),
        theme = %theme,
        child_theme = ?child_theme,
        site_url = %site_url,
        "site profile collected"
    );

    Ok(SiteProfile {
        plugins,
        theme,
        child_theme,
        site_url,
    })
}

/// Inspector backed by the `wp` command-line tool
#[derive(Debug)]
pub struct WpCli {
    /// WordPress installation root, passed as `--path` when set
    wp_root: Option<PathBuf>,
}

impl WpCli {
    /// Inspector for the WordPress installation in the current directory
    pub fn new() -> Self {
        Self { wp_root: None }
    }

    /// Inspector for a WordPress installation at a specific path
    pub fn with_root(wp_root: PathBuf) -> Self {
        Self {
            wp_root: Some(wp_root),
        }
    }

    /// Run `wp` with the given arguments and return trimmed stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut command = Command::new("wp");
        command.args(args);
        if let Some(root) = &self.wp_root {
            command.arg("--path").arg(root);
        }

        let output = command
            .output()
            .await
            .map_err(|e| Error::WpCli(format!("failed to run wp {}: {}", args.join(" "), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::WpCli(format!(
                "wp {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for WpCli {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteInspector for WpCli {
    async fn active_plugins(&self) -> Result<Vec<String>> {
        let stdout = self
            .run(&[
                "plugin",
                "list",
                "--status=active",
                "--field=name",
                "--format=json",
            ])
            .await?;
        serde_json::from_str(&stdout)
            .map_err(|e| Error::WpCli(format!("unexpected plugin list output: {}", e)))
    }

    async fn active_theme(&self) -> Result<String> {
        let stdout = self
            .run(&[
                "theme",
                "list",
                "--status=active",
                "--field=name",
                "--format=json",
            ])
            .await?;
        let names: Vec<String> = serde_json::from_str(&stdout)
            .map_err(|e| Error::WpCli(format!("unexpected theme list output: {}", e)))?;
        names
            .into_iter()
            .next()
            .ok_or_else(|| Error::WpCli("no active theme reported".to_string()))
    }

    async fn theme_parent(&self, slug: &str) -> Result<Option<String>> {
        // `template` names the parent theme directory; it equals the slug
        // itself for a standalone theme
        let template = self.run(&["theme", "get", slug, "--field=template"]).await?;
        if template.is_empty() || template == slug {
            Ok(None)
        } else {
            Ok(Some(template))
        }
    }

    async fn site_url(&self) -> Result<String> {
        self.run(&["option", "get", "siteurl"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockInspector {
        plugins: Vec<String>,
        theme: String,
        parent: Option<String>,
        url: String,
    }

    impl SiteInspector for MockInspector {
        async fn active_plugins(&self) -> Result<Vec<String>> {
            Ok(self.plugins.clone())
        }

        async fn active_theme(&self) -> Result<String> {
            Ok(self.theme.clone())
        }

        async fn theme_parent(&self, slug: &str) -> Result<Option<String>> {
            assert_eq!(slug, self.theme);
            Ok(self.parent.clone())
        }

        async fn site_url(&self) -> Result<String> {
            Ok(self.url.clone())
        }
    }

    #[tokio::test]
    async fn standalone_theme_passes_through() {
        let inspector = MockInspector {
            plugins: vec!["woocommerce".to_string()],
            theme: "astra".to_string(),
            parent: None,
            url: "https://example.com".to_string(),
        };

        let profile = collect_profile(&inspector).await.unwrap();
        assert_eq!(profile.theme, "astra");
        assert_eq!(profile.child_theme, None);
        assert_eq!(profile.plugins, vec!["woocommerce"]);
        assert_eq!(profile.site_url, "https://example.com");
    }

    #[tokio::test]
    async fn child_theme_resolves_to_parent() {
        let inspector = MockInspector {
            plugins: vec![],
            theme: "astra-child".to_string(),
            parent: Some("astra".to_string()),
            url: "https://example.com".to_string(),
        };

        let profile = collect_profile(&inspector).await.unwrap();
        // Rules are keyed by the parent theme
        assert_eq!(profile.theme, "astra");
        assert_eq!(profile.child_theme, Some("astra-child".to_string()));
    }

    struct FailingInspector;

    impl SiteInspector for FailingInspector {
        async fn active_plugins(&self) -> Result<Vec<String>> {
            Err(Error::WpCli("wp not found".to_string()))
        }

        async fn active_theme(&self) -> Result<String> {
            unreachable!("collection must stop at the first failure")
        }

        async fn theme_parent(&self, _slug: &str) -> Result<Option<String>> {
            unreachable!()
        }

        async fn site_url(&self) -> Result<String> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn inspector_failure_propagates() {
        let result = collect_profile(&FailingInspector).await;
        assert!(matches!(result, Err(Error::WpCli(_))));
    }
}
