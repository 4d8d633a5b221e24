use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{PositionInput, Snapshot};

/// The on-disk encoding of a form document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl Format {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, FormError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(Self::Yaml)
            }
            _ => Err(FormError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Errors that can occur when reading or writing form documents.
#[derive(Debug, Error)]
pub enum FormError {
    /// The file could not be read or written.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file extension is neither JSON nor YAML.
    #[error("unsupported form format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The JSON content is malformed.
    #[error("invalid JSON form: {0}")]
    Json(#[from] serde_json::Error),

    /// The YAML content is malformed.
    #[error("invalid YAML form: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A submitted form: the positions of one document instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Document")]
pub struct Form {
    /// The positions, in submitted order.
    pub positions: Vec<PositionInput>,
}

/// Forms are accepted either wrapped in an object or as a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Wrapped {
        #[serde(default)]
        positions: Vec<PositionInput>,
    },
    List(Vec<PositionInput>),
}

impl From<Document> for Form {
    fn from(document: Document) -> Self {
        match document {
            Document::Wrapped { positions } | Document::List(positions) => Self { positions },
        }
    }
}

impl From<&Snapshot> for Form {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            positions: snapshot.to_inputs(),
        }
    }
}

impl Form {
    /// Reads a form, choosing the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unsupported
    /// extension or cannot be parsed.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, FormError> {
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| FormError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, format)
    }

    /// Parses a form from text.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid form.
    pub fn parse(content: &str, format: Format) -> Result<Self, FormError> {
        Ok(match format {
            Format::Json => serde_json::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        })
    }

    /// Serializes the form to text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, format: Format) -> Result<String, FormError> {
        Ok(match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Writes the form, choosing the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unsupported or the file cannot
    /// be written.
    pub fn save(&self, path: &Path) -> Result<(), FormError> {
        let content = self.render(Format::from_path(path)?)?;
        fs::write(path, content).map_err(|source| FormError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
