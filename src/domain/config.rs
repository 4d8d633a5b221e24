use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{render::RenderOptions, validate::ValidationOptions};

/// Configuration for validating and rendering hierarchies.
///
/// This struct holds the settings a document instance may override: where
/// article numbering starts, the section headings and which advisory checks
/// run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The number of the first article in the rendered body.
    base_article: u32,

    /// Heading of the section listing all positions.
    summary_heading: String,

    /// Heading of the section describing each position.
    details_heading: String,

    /// Whether positions connected to nothing produce a warning.
    pub warn_on_orphans: bool,
}

impl Default for Config {
    fn default() -> Self {
        let headings = RenderOptions::default();
        Self {
            base_article: default_base_article(),
            summary_heading: headings.summary_heading,
            details_heading: headings.details_heading,
            warn_on_orphans: true,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration if the file exists, and the defaults
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of the first article.
    #[must_use]
    pub const fn base_article(&self) -> u32 {
        self.base_article
    }

    /// Overrides the number of the first article.
    pub const fn set_base_article(&mut self, base_article: u32) {
        self.base_article = base_article;
    }

    /// The headings to render with.
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            summary_heading: self.summary_heading.clone(),
            details_heading: self.details_heading.clone(),
        }
    }

    /// The advisory checks to validate with.
    #[must_use]
    pub const fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            warn_on_orphans: self.warn_on_orphans,
        }
    }
}

const fn default_base_article() -> u32 {
    1
}

fn default_summary_heading() -> String {
    RenderOptions::default().summary_heading
}

fn default_details_heading() -> String {
    RenderOptions::default().details_heading
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_base_article")]
        base_article: u32,

        #[serde(default = "default_summary_heading")]
        summary_heading: String,

        #[serde(default = "default_details_heading")]
        details_heading: String,

        #[serde(default = "default_true")]
        warn_on_orphans: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                base_article,
                summary_heading,
                details_heading,
                warn_on_orphans,
            } => Self {
                base_article,
                summary_heading,
                details_heading,
                warn_on_orphans,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            base_article: config.base_article,
            summary_heading: config.summary_heading,
            details_heading: config.details_heading,
            warn_on_orphans: config.warn_on_orphans,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nbase_article = 12\nsummary_heading = \"Systematization\"\nwarn_on_orphans = false\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.base_article(), 12);
        assert_eq!(config.render_options().summary_heading, "Systematization");
        assert_eq!(config.render_options().details_heading, "Position details");
        assert!(!config.validation_options().warn_on_orphans);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nbase_article = \"one\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("orgchart.toml");

        let mut config = Config::default();
        config.set_base_article(40);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap().base_article(), 40);
    }
}
