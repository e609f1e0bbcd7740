//! Error Types
//!
//! One error enum for the whole library. Per-character variants
//! (`MalformedProgression`, `MissingField`, `Http`) are isolated by the
//! batch assembler. Everything else aborts a run before any drawing happens.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComparisonError {
    /// Raid summary string did not match `<killed>/<available><letter>`.
    #[error("malformed progression summary '{summary}': {reason}")]
    MalformedProgression { summary: String, reason: String },

    /// Expected field missing (or mistyped) in an API response.
    #[error("missing field '{field}' in profile response")]
    MissingField { field: String },

    /// Icon or background image could not be located or decoded.
    #[error("unresolved asset '{name}' in {dir}")]
    UnresolvedAsset { name: String, dir: PathBuf },

    /// Caller supplied both a roster file and inline roster data.
    #[error("only one of a roster file and inline roster data can be supplied")]
    DuplicateArgument,

    /// Caller supplied neither a roster file nor inline roster data.
    #[error("a roster file or inline roster data is required")]
    MissingInput,

    /// Completion fraction not covered by the colour table.
    #[error("fraction {fraction} is outside the colour table range [0, {upper})")]
    OutOfRange { fraction: f64, upper: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Chart backend failure, flattened to text since backend errors are generic.
    #[error("drawing error: {0}")]
    Draw(String),
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for ComparisonError
where
    E: std::error::Error + Send + Sync,
{
    fn from(error: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Self::Draw(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComparisonError>;

impl ComparisonError {
    pub(crate) fn malformed(summary: &str, reason: impl Into<String>) -> Self {
        Self::MalformedProgression {
            summary: summary.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    /// Errors that only invalidate a single character during batch assembly
    pub fn is_per_character(&self) -> bool {
        matches!(
            self,
            Self::MalformedProgression { .. } | Self::MissingField { .. } | Self::Http(_)
        )
    }
}
