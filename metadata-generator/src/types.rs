use serde::{Deserialize, Serialize};
use std::fmt;
// Use the interfaces crate for the shared data model and collaborators
pub use interfaces::defs::{AssetFile, AssetLink, CreatedRecord, FieldKind, FieldValue, RecordFields, ResolvedAsset};
pub use interfaces::defs::{CaptionService, FieldAccessor, LocaleResolver, Notifier, PersistenceClient, SummaryService};

/// Fixed placeholders substituted when generation produces nothing usable.
pub mod sentinel {
    pub const NO_TEXT_FIELDS: &str = "No text fields found to generate a summary.";
    pub const SUMMARY_FAILED: &str = "Error generating summary. Check the console.";
    pub const SUMMARY_BLANK: &str = "No summary generated";
    pub const CAPTION_FAILED: &str = "Error generating alt text.";
    pub const CAPTION_BLANK: &str = "No alt text generated.";
}

/// Separator placed between the captions of a multi-image field.
pub const CAPTION_SEPARATOR: &str = "\n\n---\n\n";

/// Shape of the summary produced by the configured prompt variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryShape {
    PlainText,
    Structured,
}

/// How the summary service formats structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Bare JSON object.
    Json,
    /// JSON optionally wrapped in a markdown code fence.
    FencedJson,
}

/// Where an uploaded summary is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadTarget {
    NewRecord { content_type: String },
    SourceRecord,
}

/// Field ids used when persisting a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoFieldMapping {
    pub reference: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub reference_prefix: String,
    pub tag_separator: String,
}

impl Default for SeoFieldMapping {
    fn default() -> Self {
        Self {
            reference: "blogTitle".to_string(),
            title: "seoTitle".to_string(),
            description: "seoSummary".to_string(),
            tags: "seoTags".to_string(),
            reference_prefix: "SEO: ".to_string(),
            tag_separator: ", ".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub summary_shape: SummaryShape,
    pub response_format: ResponseFormat,
    pub upload_target: UploadTarget,
    pub seo_fields: SeoFieldMapping,
    pub display_name_field: String,
    pub alt_text_suffix: String,
    pub caption_concurrency: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            summary_shape: SummaryShape::Structured,
            response_format: ResponseFormat::FencedJson,
            upload_target: UploadTarget::NewRecord {
                content_type: "seoMetadata".to_string(),
            },
            seo_fields: SeoFieldMapping::default(),
            display_name_field: "title".to_string(),
            alt_text_suffix: "AltText".to_string(),
            caption_concurrency: 1, // strictly sequential
        }
    }
}

impl GeneratorConfig {
    /// Target field for the alt text of an image field, e.g. `heroAltText`.
    pub fn alt_text_field(&self, field_id: &str) -> String {
        format!("{}{}", field_id, self.alt_text_suffix)
    }
}

/// Editor session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Generating,
    Generated,
    Uploading,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Generating => "generating",
            SessionState::Generated => "generated",
            SessionState::Uploading => "uploading",
        };
        f.write_str(name)
    }
}

/// The two independently uploadable result classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Summary,
    AltText,
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Summary => f.write_str("summary"),
            UploadKind::AltText => f.write_str("alt text"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Cannot {action} while {state}")]
    InvalidState { action: &'static str, state: SessionState },

    #[error("Nothing staged to upload for {0}")]
    NotReady(UploadKind),

    #[error("Summary is not uploadable: {0}")]
    SummaryUnavailable(String),

    #[error("Summary parse error: {0}")]
    SummaryParse(String),

    #[error("Invalid summary: {0}")]
    InvalidSummary(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
