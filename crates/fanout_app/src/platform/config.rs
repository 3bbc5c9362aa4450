//! Run configuration loaded from a RON file next to the binary's working directory.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::{engine_info, engine_warn};
use fanout_engine::FetchSettings;
use serde::{Deserialize, Serialize};

const DEFAULT_SITES: [&str; 20] = [
    "https://www.youtube.com",
    "https://www.google.com",
    "https://www.twitter.com",
    "https://www.cnn.com",
    "https://www.yahoo.com",
    "https://www.facebook.com",
    "https://www.sourceforge.net",
    "https://www.codeproject.com",
    "https://www.stackoverflow.com",
    "https://www.wikipedia.org/wiki/.NET_Framework",
    "https://time.com/4960202/most-influential-websites/",
    "https://www.webopedia.com/TERM/A/application.html",
    "https://ahrefs.com/blog/most-visited-websites/",
    "https://www.google.com/business/website-builder/",
    "https://www.wix.com/",
    "https://99designs.com/blog/web-digital/types-of-websites/",
    "https://blog.hubspot.com/marketing/best-website-designs-list",
    "https://www.britannica.com/technology/software",
    "https://www.sciencedaily.com/terms/computer_software.htm",
    "https://www.computerhope.com/jargon/s/software.htm",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// URLs fetched by every run, in dispatch order.
    pub tasks: Vec<String>,
    /// `None` uses one worker per available processing unit.
    pub max_workers: Option<usize>,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_SITES.iter().map(|site| site.to_string()).collect(),
            max_workers: None,
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&FetchSettings::default())
    }
}

impl From<&FetchSettings> for FetchConfig {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            connect_timeout_ms: settings.connect_timeout.as_millis() as u64,
            request_timeout_ms: settings.request_timeout.as_millis() as u64,
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            allowed_content_types: settings.allowed_content_types.clone(),
        }
    }
}

impl FetchConfig {
    pub fn to_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }
}

/// Loads the configuration at `path`. A missing file yields the defaults;
/// an unreadable or malformed one is an error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_info!("No config at {}; using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };

    let config: AppConfig =
        ron::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    if config.tasks.is_empty() {
        engine_warn!("Config {} lists no tasks; runs will finish immediately", path.display());
    }
    engine_info!(
        "Loaded {} tasks from {} (max_workers={:?})",
        config.tasks.len(),
        path.display(),
        config.max_workers
    );
    Ok(config)
}

/// Writes the default configuration to `path`, refusing to overwrite an existing file.
pub fn save_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let pretty = ron::ser::PrettyConfig::new().depth_limit(3);
    let text = ron::ser::to_string_pretty(&AppConfig::default(), pretty)
        .context("serializing default config")?;
    fs::write(path, text).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.ron")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tasks.len(), 20);
        assert_eq!(config.tasks[0], "https://www.youtube.com");
    }

    #[test]
    fn partial_file_keeps_defaults_for_omitted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fanout.ron");
        fs::write(
            &path,
            r#"(tasks: ["https://a.test/", "https://b.test/"], max_workers: Some(3), fetch: (max_bytes: 1024))"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.tasks, vec!["https://a.test/", "https://b.test/"]);
        assert_eq!(config.max_workers, Some(3));
        assert_eq!(config.fetch.max_bytes, 1024);
        assert_eq!(config.fetch.redirect_limit, FetchConfig::default().redirect_limit);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fanout.ron");
        fs::write(&path, "(tasks: [unterminated").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn saved_default_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fanout.ron");

        save_default_config(&path).unwrap();
        assert_eq!(load_config(&path).unwrap(), AppConfig::default());
        assert!(save_default_config(&path).is_err());
    }

    #[test]
    fn fetch_settings_use_milliseconds() {
        let fetch = FetchConfig {
            connect_timeout_ms: 1500,
            request_timeout_ms: 250,
            ..FetchConfig::default()
        };
        let settings = fetch.to_settings();

        assert_eq!(settings.connect_timeout, Duration::from_millis(1500));
        assert_eq!(settings.request_timeout, Duration::from_millis(250));
    }
}
