use crate::types::{CaptionService, SummaryService, SummaryShape};
use crate::utils::text::{extract_keywords, smart_truncate};
use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

/// Offline stand-in for the summary service, for development and testing
pub struct MockSummaryService {
    name: String,
    shape: SummaryShape,
    fenced: bool,
    response_delay_ms: u64,
}

impl MockSummaryService {
    pub fn new(name: String, shape: SummaryShape) -> Self {
        Self {
            name,
            shape,
            fenced: true, // like most chat models do
            response_delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    /// Emit bare JSON instead of a fenced block.
    pub fn unfenced(mut self) -> Self {
        self.fenced = false;
        self
    }

    async fn simulate_processing(&self) {
        if self.response_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.response_delay_ms)).await;
        }
    }
}

#[async_trait]
impl SummaryService for MockSummaryService {
    fn service_name(&self) -> String {
        format!("Mock summary service ({})", self.name)
    }

    async fn generate_summary(&self, text: &str) -> Result<String> {
        self.simulate_processing().await;

        if text.trim().is_empty() {
            bail!("summary requested for empty text");
        }

        let title = text.lines().next().unwrap_or_default().trim().to_string();
        let description = smart_truncate(&text.split_whitespace().collect::<Vec<_>>().join(" "), 155);
        let mut tags = extract_keywords(text);
        tags.truncate(5);
        debug!("Mock summary with {} tags", tags.len());

        let response = match self.shape {
            SummaryShape::PlainText => format!("{}\n\n{}", description, tags.join(" ")),
            SummaryShape::Structured => {
                let json = serde_json::to_string_pretty(&serde_json::json!({
                    "title": title,
                    "description": description,
                    "tags": tags,
                }))?;
                if self.fenced {
                    format!("```json\n{}\n```", json)
                } else {
                    json
                }
            }
        };
        Ok(response)
    }
}

/// Offline stand-in for the captioning service.
pub struct MockCaptionService {
    name: String,
    response_delay_ms: u64,
}

impl MockCaptionService {
    pub fn new(name: String) -> Self {
        Self {
            name,
            response_delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }
}

#[async_trait]
impl CaptionService for MockCaptionService {
    fn service_name(&self) -> String {
        format!("Mock caption service ({})", self.name)
    }

    async fn generate_caption(&self, url: &str, mime_type: &str) -> Result<String> {
        if self.response_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.response_delay_ms)).await;
        }

        let file_name = url::Url::parse(url)?
            .path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "image".to_string());
        let stem = file_name.split('.').next().unwrap_or(&file_name).replace(['-', '_'], " ");
        let format = mime_type.strip_prefix("image/").unwrap_or(mime_type).to_uppercase();

        Ok(format!("{} image showing {}", format, stem))
    }
}
