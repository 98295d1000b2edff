use crate::aggregator::{AltTextMap, StagedSummary};
use crate::types::{
    FieldAccessor, GeneratorConfig, GeneratorError, Notifier, PersistenceClient, RecordFields, ResponseFormat, Result,
    SummaryShape, UploadTarget,
};
use crate::utils::text::strip_code_fence;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Structured summary as returned by the summary service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoSummary {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Summary result in the shape the prompt variant was configured for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Text(String),
    Structured(SeoSummary),
}

/// Validated summary ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl UploadPayload {
    /// Plain-text summaries become the description, titled after the source record.
    pub fn from_result(result: GenerationResult, display_name: &str) -> Self {
        match result {
            GenerationResult::Structured(summary) => Self {
                title: summary.title,
                description: summary.description,
                tags: summary.tags,
            },
            GenerationResult::Text(text) => Self {
                title: display_name.to_string(),
                description: text.trim().to_string(),
                tags: Vec::new(),
            },
        }
    }
}

/// Parse a structured summary.
///
/// With [`ResponseFormat::FencedJson`] one surrounding code fence is stripped
/// first; with [`ResponseFormat::Json`] the text must be a bare object. `tags`
/// defaults to an empty list when missing or not a list, and non-string tags
/// are dropped.
pub fn parse_summary(raw: &str, format: ResponseFormat) -> Result<SeoSummary> {
    let body = match format {
        ResponseFormat::Json => raw.trim().to_string(),
        ResponseFormat::FencedJson => strip_code_fence(raw),
    };

    let value: Value = serde_json::from_str(&body).map_err(|e| GeneratorError::SummaryParse(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(GeneratorError::InvalidSummary("summary is not a JSON object".to_string()));
    };

    let title = string_field(&object, "title")?;
    let description = string_field(&object, "description")?;
    let tags = match object.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|tag| tag.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    Ok(SeoSummary {
        title,
        description,
        tags,
    })
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Result<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GeneratorError::InvalidSummary(format!("missing string field `{}`", key)))
}

/// Outcome of persisting a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryUploadReport {
    pub payload: Option<UploadPayload>,
    /// Id of the record created for a `NewRecord` target.
    pub record_id: Option<String>,
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl SummaryUploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of writing alt texts back to the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltTextUploadReport {
    /// Target fields that were written.
    pub written: Vec<String>,
    /// Image fields whose alt text field does not exist.
    pub skipped: Vec<String>,
    /// Image fields whose write failed.
    pub failed: Vec<String>,
}

impl AltTextUploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum WriteOutcome {
    Written,
    Missing,
    Failed,
}

/// Writes staged results back through the persistence collaborators.
pub struct UploadCoordinator {
    fields: Arc<dyn FieldAccessor>,
    persistence: Arc<dyn PersistenceClient>,
    notifier: Arc<dyn Notifier>,
    config: Arc<GeneratorConfig>,
}

impl UploadCoordinator {
    pub fn new(
        fields: Arc<dyn FieldAccessor>,
        persistence: Arc<dyn PersistenceClient>,
        notifier: Arc<dyn Notifier>,
        config: Arc<GeneratorConfig>,
    ) -> Self {
        Self {
            fields,
            persistence,
            notifier,
            config,
        }
    }

    /// Display name of the record being edited, falling back to its id.
    pub fn display_name(&self) -> String {
        self.fields
            .get_value(&self.config.display_name_field)
            .and_then(|value| value.as_str().map(|name| name.trim().to_string()))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.fields.record_id())
    }

    /// Validate the staged summary and persist it to the configured target.
    ///
    /// Parse and validation failures abort before anything is written.
    pub async fn upload_summary(&self, staged: &StagedSummary) -> Result<SummaryUploadReport> {
        if staged.is_sentinel() {
            warn!("Refusing to upload placeholder summary ({:?})", staged.status);
            self.notifier.error("There is no generated summary to save.");
            return Err(GeneratorError::SummaryUnavailable(staged.text.clone()));
        }

        let result = match self.config.summary_shape {
            SummaryShape::PlainText => GenerationResult::Text(staged.text.clone()),
            SummaryShape::Structured => match parse_summary(&staged.text, self.config.response_format) {
                Ok(summary) => GenerationResult::Structured(summary),
                Err(e) => {
                    error!("Failed to parse summary JSON: {} (raw: {})", e, staged.text);
                    self.notifier.error("Could not parse the generated summary. Regenerate and try again.");
                    return Err(e);
                }
            },
        };

        let display_name = self.display_name();
        let payload = UploadPayload::from_result(result, &display_name);
        info!("Uploading summary \"{}\" with {} tags", payload.title, payload.tags.len());

        let mut report = match &self.config.upload_target {
            UploadTarget::NewRecord { content_type } => {
                self.create_summary_record(content_type, &display_name, &payload).await?
            }
            UploadTarget::SourceRecord => self.write_summary_fields(&payload).await,
        };

        if !report.failed.is_empty() {
            self.notifier.error("Failed to save SEO content. See console for details.");
        } else if !report.skipped.is_empty() {
            self.notifier.warning(&format!(
                "SEO content saved, but fields were missing: {}",
                report.skipped.join(", ")
            ));
        } else {
            self.notifier.success("SEO content saved successfully!");
        }

        report.payload = Some(payload);
        Ok(report)
    }

    async fn create_summary_record(
        &self,
        content_type: &str,
        display_name: &str,
        payload: &UploadPayload,
    ) -> Result<SummaryUploadReport> {
        let mapping = &self.config.seo_fields;
        let mut fields = RecordFields::new();
        fields.insert(
            mapping.reference.clone(),
            Value::String(format!("{}{}", mapping.reference_prefix, display_name)),
        );
        fields.insert(mapping.title.clone(), Value::String(payload.title.clone()));
        fields.insert(mapping.description.clone(), Value::String(payload.description.clone()));
        fields.insert(mapping.tags.clone(), Value::String(payload.tags.join(mapping.tag_separator.as_str())));

        match self.persistence.create_record(content_type, fields).await {
            Ok(created) => {
                info!("Created {} record with ID: {}", content_type, created.id);
                Ok(SummaryUploadReport {
                    record_id: Some(created.id),
                    ..Default::default()
                })
            }
            Err(e) => {
                error!("Error uploading summary as {}: {:#}", content_type, e);
                self.notifier.error("Failed to save SEO content. See console for details.");
                Err(GeneratorError::Persistence(e.to_string()))
            }
        }
    }

    async fn write_summary_fields(&self, payload: &UploadPayload) -> SummaryUploadReport {
        let mapping = &self.config.seo_fields;
        let entries = [
            (&mapping.title, Value::String(payload.title.clone())),
            (&mapping.description, Value::String(payload.description.clone())),
            (&mapping.tags, Value::String(payload.tags.join(mapping.tag_separator.as_str()))),
        ];

        let mut report = SummaryUploadReport::default();
        for (field_id, value) in entries {
            match self.write_field(field_id, value).await {
                WriteOutcome::Written => report.written.push(field_id.clone()),
                WriteOutcome::Missing => {
                    warn!("Field \"{}\" not found. Skipping.", field_id);
                    report.skipped.push(field_id.clone());
                }
                WriteOutcome::Failed => report.failed.push(field_id.clone()),
            }
        }
        report
    }

    /// Write each alt text to `<fieldId><suffix>`. A missing target skips that
    /// entry only; the rest of the batch still runs.
    pub async fn upload_alt_texts(&self, alt_texts: &AltTextMap) -> AltTextUploadReport {
        let mut report = AltTextUploadReport::default();

        for (image_field, alt_text) in alt_texts {
            let target = self.config.alt_text_field(image_field);
            match self.write_field(&target, Value::String(alt_text.clone())).await {
                WriteOutcome::Written => report.written.push(target),
                WriteOutcome::Missing => {
                    warn!("Field \"{}\" not found. Skipping.", target);
                    self.notifier
                        .warning(&format!("Could not find alt text field for \"{}\".", image_field));
                    report.skipped.push(image_field.clone());
                }
                WriteOutcome::Failed => report.failed.push(image_field.clone()),
            }
        }

        info!(
            "Alt text upload: {} written, {} skipped, {} failed",
            report.written.len(),
            report.skipped.len(),
            report.failed.len()
        );

        if !report.failed.is_empty() {
            self.notifier.error(&format!(
                "Failed to save alt text for {}. See console for details.",
                report.failed.join(", ")
            ));
        } else if !report.skipped.is_empty() {
            self.notifier.warning(&format!(
                "Saved {} alt texts, skipped {} without a target field.",
                report.written.len(),
                report.skipped.len()
            ));
        } else {
            self.notifier.success("Alt text saved successfully!");
        }

        report
    }

    async fn write_field(&self, field_id: &str, value: Value) -> WriteOutcome {
        if !self.fields.has_field(field_id) {
            return WriteOutcome::Missing;
        }

        match self.fields.set_value(field_id, value).await {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                error!("Failed to set field {}: {:#}", field_id, e);
                WriteOutcome::Failed
            }
        }
    }
}
