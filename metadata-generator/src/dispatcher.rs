use crate::resolver::{AssetReference, FieldAssets};
use crate::scanner::ScannedText;
use crate::types::{sentinel, CaptionService, SummaryService};
use crate::utils::text::is_blank;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of the single summary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    /// The service answered with blank text.
    Blank,
    Failed(String),
    /// Nothing to summarize, the service was not called.
    NoInput,
}

impl SummaryOutcome {
    /// Text to stage: the summary itself or its sentinel.
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::Blank => sentinel::SUMMARY_BLANK,
            SummaryOutcome::Failed(_) => sentinel::SUMMARY_FAILED,
            SummaryOutcome::NoInput => sentinel::NO_TEXT_FIELDS,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, SummaryOutcome::Generated(_))
    }
}

/// Result of captioning one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionOutcome {
    Generated(String),
    Blank,
    Failed(String),
}

impl CaptionOutcome {
    pub fn text(&self) -> &str {
        match self {
            CaptionOutcome::Generated(text) => text,
            CaptionOutcome::Blank => sentinel::CAPTION_BLANK,
            CaptionOutcome::Failed(_) => sentinel::CAPTION_FAILED,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, CaptionOutcome::Generated(_))
    }
}

/// Caption outcomes of one field, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCaptions {
    pub field_id: String,
    pub captions: Vec<CaptionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutput {
    pub summary: SummaryOutcome,
    pub captions: Vec<FieldCaptions>,
}

/// Issues the summary request and one caption request per image.
///
/// Every call is isolated: a failure becomes a sentinel outcome for that call
/// only. Nothing is retried here.
pub struct GenerationDispatcher {
    summaries: Arc<dyn SummaryService>,
    captions: Arc<dyn CaptionService>,
    concurrency: usize,
}

impl GenerationDispatcher {
    pub fn new(summaries: Arc<dyn SummaryService>, captions: Arc<dyn CaptionService>) -> Self {
        Self {
            summaries,
            captions,
            concurrency: 1,
        }
    }

    /// Allow up to `limit` caption requests in flight. Results still join in
    /// field, then list, order.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub async fn dispatch(&self, text: &ScannedText, fields: &[FieldAssets]) -> DispatchOutput {
        // The summary always settles before any caption request starts
        let summary = self.summarize(text).await;
        let captions = self.caption_all(fields).await;

        DispatchOutput { summary, captions }
    }

    pub async fn summarize(&self, text: &ScannedText) -> SummaryOutcome {
        let Some(text) = text.as_text() else {
            info!("No text fields found, skipping summary request");
            return SummaryOutcome::NoInput;
        };

        info!(
            "Requesting summary from {} for {} chars of text",
            self.summaries.service_name(),
            text.len()
        );

        match self.summaries.generate_summary(text).await {
            Ok(summary) if is_blank(&summary) => {
                warn!("Summary service returned no text");
                SummaryOutcome::Blank
            }
            Ok(summary) => SummaryOutcome::Generated(summary),
            Err(e) => {
                error!("Error generating summary: {:#}", e);
                SummaryOutcome::Failed(e.to_string())
            }
        }
    }

    async fn caption_all(&self, fields: &[FieldAssets]) -> Vec<FieldCaptions> {
        let requests: Vec<(&str, &AssetReference)> = fields
            .iter()
            .flat_map(|field| field.assets.iter().map(move |asset| (field.field_id.as_str(), asset)))
            .collect();

        info!(
            "Requesting {} captions from {} (concurrency {})",
            requests.len(),
            self.captions.service_name(),
            self.concurrency
        );

        // `buffered` yields in submission order regardless of completion order
        let mut outcomes = stream::iter(requests)
            .map(|(field_id, asset)| self.caption(field_id, asset))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter();

        fields
            .iter()
            .map(|field| FieldCaptions {
                field_id: field.field_id.clone(),
                captions: outcomes.by_ref().take(field.assets.len()).collect(),
            })
            .collect()
    }

    async fn caption(&self, field_id: &str, asset: &AssetReference) -> CaptionOutcome {
        debug!("Captioning asset {} of field {}", asset.asset_id, field_id);

        match self.captions.generate_caption(&asset.url, &asset.mime_type).await {
            Ok(caption) if is_blank(&caption) => {
                warn!("Caption service returned no text for asset {} in {}", asset.asset_id, field_id);
                CaptionOutcome::Blank
            }
            Ok(caption) => CaptionOutcome::Generated(caption.trim().to_string()),
            Err(e) => {
                error!("Error generating alt text for {} (asset {}): {:#}", field_id, asset.asset_id, e);
                CaptionOutcome::Failed(e.to_string())
            }
        }
    }
}
