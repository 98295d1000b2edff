use crate::dispatcher::{CaptionOutcome, DispatchOutput, SummaryOutcome};
use crate::types::{ResponseFormat, Result, CAPTION_SEPARATOR};
use crate::upload::{parse_summary, SeoSummary};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Field id to alt text, in field enumeration order.
pub type AltTextMap = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Generated,
    Blank,
    Failed,
    NoInput,
}

impl From<&SummaryOutcome> for SummaryStatus {
    fn from(outcome: &SummaryOutcome) -> Self {
        match outcome {
            SummaryOutcome::Generated(_) => SummaryStatus::Generated,
            SummaryOutcome::Blank => SummaryStatus::Blank,
            SummaryOutcome::Failed(_) => SummaryStatus::Failed,
            SummaryOutcome::NoInput => SummaryStatus::NoInput,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSummary {
    pub text: String,
    pub status: SummaryStatus,
}

impl StagedSummary {
    /// Sentinel summaries are shown to the user but never persisted.
    pub fn is_sentinel(&self) -> bool {
        self.status != SummaryStatus::Generated
    }
}

/// Results of one generation run, held until uploaded or regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedResults {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: Option<StagedSummary>,
    pub alt_texts: AltTextMap,
    pub failed_captions: usize,
}

impl StagedResults {
    pub fn can_upload_summary(&self) -> bool {
        self.summary
            .as_ref()
            .map_or(false, |summary| !summary.text.trim().is_empty())
    }

    pub fn can_upload_alt(&self) -> bool {
        !self.alt_texts.is_empty()
    }

    /// True once both result classes have been consumed. A sentinel summary
    /// can never be persisted, so it counts as consumed.
    pub fn is_drained(&self) -> bool {
        let summary_pending = self
            .summary
            .as_ref()
            .map_or(false, |summary| !summary.is_sentinel() && !summary.text.trim().is_empty());
        !summary_pending && !self.can_upload_alt()
    }

    pub fn clear_summary(&mut self) {
        self.summary = None;
    }

    pub fn clear_alt_texts(&mut self) {
        self.alt_texts.clear();
        self.failed_captions = 0;
    }

    /// Parse a staged structured summary for display without uploading it.
    pub fn preview(&self, format: ResponseFormat) -> Option<Result<SeoSummary>> {
        self.summary
            .as_ref()
            .filter(|summary| !summary.is_sentinel())
            .map(|summary| parse_summary(&summary.text, format))
    }
}

/// Merges dispatcher output into staged results.
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn aggregate(output: DispatchOutput) -> StagedResults {
        let summary = StagedSummary {
            text: output.summary.text().to_string(),
            status: SummaryStatus::from(&output.summary),
        };

        let mut alt_texts = AltTextMap::new();
        let mut failed_captions = 0;

        for field in output.captions {
            if field.captions.is_empty() {
                continue;
            }
            failed_captions += field
                .captions
                .iter()
                .filter(|caption| matches!(caption, CaptionOutcome::Failed(_)))
                .count();

            let joined = field
                .captions
                .iter()
                .map(CaptionOutcome::text)
                .collect::<Vec<_>>()
                .join(CAPTION_SEPARATOR);
            alt_texts.insert(field.field_id, joined);
        }

        let staged = StagedResults {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary: Some(summary),
            alt_texts,
            failed_captions,
        };

        info!(
            "Staged run {}: summary {:?}, {} alt texts ({} failed captions)",
            staged.run_id,
            staged.summary.as_ref().map(|summary| summary.status),
            staged.alt_texts.len(),
            staged.failed_captions
        );
        staged
    }
}
