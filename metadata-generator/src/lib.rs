pub mod types;
pub mod utils;
pub mod scanner;
pub mod resolver;
pub mod dispatcher;
pub mod aggregator;
pub mod upload;
pub mod pipeline;
pub mod llm_adapter;
pub mod memory;

pub use types::*;
pub use scanner::{FieldScanner, ScannedText};
pub use resolver::{AssetReference, AssetResolver, FieldAssets};
pub use dispatcher::{CaptionOutcome, DispatchOutput, FieldCaptions, GenerationDispatcher, SummaryOutcome};
pub use aggregator::{AltTextMap, ResultAggregator, StagedResults, StagedSummary, SummaryStatus};
pub use upload::{parse_summary, AltTextUploadReport, GenerationResult, SeoSummary, SummaryUploadReport, UploadCoordinator, UploadPayload};
pub use pipeline::{MetadataPipeline, PipelineBuilder};
pub use llm_adapter::{MockCaptionService, MockSummaryService};
pub use memory::{InMemoryRecord, InMemorySpace, Notification, NotificationLevel, RecordingNotifier};
