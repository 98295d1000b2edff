use crate::aggregator::{ResultAggregator, StagedResults};
use crate::dispatcher::GenerationDispatcher;
use crate::resolver::AssetResolver;
use crate::scanner::FieldScanner;
use crate::types::{
    CaptionService, FieldAccessor, GeneratorConfig, GeneratorError, LocaleResolver, Notifier, PersistenceClient,
    Result, SessionState, SummaryService, SummaryShape, UploadKind,
};
use crate::upload::{AltTextUploadReport, SeoSummary, SummaryUploadReport, UploadCoordinator};
use interfaces::{FixedLocale, SilentNotifier};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-session orchestrator: generate, review, then upload each result class.
///
/// State moves `Idle -> Generating -> Generated -> Uploading -> Idle | Generated`.
/// The session is the only writer of the staged results.
pub struct MetadataPipeline {
    fields: Arc<dyn FieldAccessor>,
    resolver: AssetResolver,
    dispatcher: GenerationDispatcher,
    uploader: UploadCoordinator,
    config: Arc<GeneratorConfig>,
    state: SessionState,
    staged: Option<StagedResults>,
}

impl MetadataPipeline {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn staged(&self) -> Option<&StagedResults> {
        self.staged.as_ref()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn can_generate(&self) -> bool {
        matches!(self.state, SessionState::Idle | SessionState::Generated)
    }

    pub fn can_upload_summary(&self) -> bool {
        self.state == SessionState::Generated && self.staged.as_ref().map_or(false, StagedResults::can_upload_summary)
    }

    pub fn can_upload_alt(&self) -> bool {
        self.state == SessionState::Generated && self.staged.as_ref().map_or(false, StagedResults::can_upload_alt)
    }

    /// Parsed view of a staged structured summary, if there is one.
    pub fn preview(&self) -> Option<Result<SeoSummary>> {
        if self.config.summary_shape != SummaryShape::Structured {
            return None;
        }
        self.staged.as_ref()?.preview(self.config.response_format)
    }

    /// Run scan, resolve, dispatch and aggregate. Prior results are discarded
    /// before anything new is requested.
    pub async fn generate(&mut self) -> Result<&StagedResults> {
        if !self.can_generate() {
            return Err(GeneratorError::InvalidState {
                action: "generate",
                state: self.state,
            });
        }

        self.staged = None;
        self.state = SessionState::Generating;
        info!("Generating metadata for record {}", self.fields.record_id());

        let snapshot = self.fields.snapshot();
        let text = FieldScanner::scan(&snapshot);
        let assets = self.resolver.resolve(&snapshot).await;
        let output = self.dispatcher.dispatch(&text, &assets).await;
        let staged = ResultAggregator::aggregate(output);

        self.state = SessionState::Generated;
        Ok(self.staged.insert(staged))
    }

    /// Persist the staged summary. On success only the summary is cleared; on
    /// failure everything stays staged for a retry. A placeholder summary is
    /// refused and cleared.
    pub async fn upload_summary(&mut self) -> Result<SummaryUploadReport> {
        self.ensure_generated("upload summary")?;

        let summary = self
            .staged
            .as_ref()
            .filter(|staged| staged.can_upload_summary())
            .and_then(|staged| staged.summary.clone())
            .ok_or(GeneratorError::NotReady(UploadKind::Summary))?;

        self.state = SessionState::Uploading;
        let result = self.uploader.upload_summary(&summary).await;
        self.state = SessionState::Generated;

        let report = match result {
            Ok(report) => report,
            Err(GeneratorError::SummaryUnavailable(text)) => {
                // A placeholder is refused once, then dropped with its flag
                if let Some(staged) = self.staged.as_mut() {
                    staged.clear_summary();
                }
                self.settle();
                return Err(GeneratorError::SummaryUnavailable(text));
            }
            Err(e) => return Err(e),
        };
        if report.is_complete() {
            if let Some(staged) = self.staged.as_mut() {
                staged.clear_summary();
            }
            self.settle();
        } else {
            warn!("Summary upload incomplete, keeping staged summary for retry");
        }
        Ok(report)
    }

    /// Write staged alt texts to their target fields. The map is cleared unless
    /// a write failed; missing target fields only produce warnings.
    pub async fn upload_alt_texts(&mut self) -> Result<AltTextUploadReport> {
        self.ensure_generated("upload alt text")?;

        let alt_texts = self
            .staged
            .as_ref()
            .filter(|staged| staged.can_upload_alt())
            .map(|staged| staged.alt_texts.clone())
            .ok_or(GeneratorError::NotReady(UploadKind::AltText))?;

        self.state = SessionState::Uploading;
        let report = self.uploader.upload_alt_texts(&alt_texts).await;
        self.state = SessionState::Generated;

        if report.is_complete() {
            if let Some(staged) = self.staged.as_mut() {
                staged.clear_alt_texts();
            }
            self.settle();
        } else {
            warn!("Alt text upload had failures, keeping staged alt text for retry");
        }
        Ok(report)
    }

    fn ensure_generated(&self, action: &'static str) -> Result<()> {
        if self.state == SessionState::Generated {
            Ok(())
        } else {
            Err(GeneratorError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    /// Return to idle once both result classes are consumed.
    fn settle(&mut self) {
        if self.staged.as_ref().map_or(true, StagedResults::is_drained) {
            self.staged = None;
            self.state = SessionState::Idle;
            info!("All staged results uploaded, session idle");
        }
    }
}

/// Pipeline builder wiring the host's collaborators into a session
pub struct PipelineBuilder {
    fields: Arc<dyn FieldAccessor>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    summaries: Option<Arc<dyn SummaryService>>,
    captions: Option<Arc<dyn CaptionService>>,
    notifier: Arc<dyn Notifier>,
    locales: Arc<dyn LocaleResolver>,
    config: GeneratorConfig,
}

impl PipelineBuilder {
    pub fn new(fields: Arc<dyn FieldAccessor>) -> Self {
        Self {
            fields,
            persistence: None,
            summaries: None,
            captions: None,
            notifier: Arc::new(SilentNotifier),
            locales: Arc::new(FixedLocale::default()),
            config: GeneratorConfig::default(),
        }
    }

    pub fn persistence(mut self, persistence: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn summary_service(mut self, service: Arc<dyn SummaryService>) -> Self {
        self.summaries = Some(service);
        self
    }

    pub fn caption_service(mut self, service: Arc<dyn CaptionService>) -> Self {
        self.captions = Some(service);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn locale_resolver(mut self, locales: Arc<dyn LocaleResolver>) -> Self {
        self.locales = locales;
        self
    }

    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<MetadataPipeline> {
        let persistence = self
            .persistence
            .ok_or_else(|| GeneratorError::General("A persistence client is required".to_string()))?;
        let summaries = self
            .summaries
            .ok_or_else(|| GeneratorError::General("A summary service is required".to_string()))?;
        let captions = self
            .captions
            .ok_or_else(|| GeneratorError::General("A caption service is required".to_string()))?;

        let config = Arc::new(self.config);
        let resolver = AssetResolver::new(persistence.clone(), self.locales);
        let dispatcher = GenerationDispatcher::new(summaries, captions).with_concurrency(config.caption_concurrency);
        let uploader = UploadCoordinator::new(self.fields.clone(), persistence, self.notifier, config.clone());

        Ok(MetadataPipeline {
            fields: self.fields,
            resolver,
            dispatcher,
            uploader,
            config,
            state: SessionState::Idle,
            staged: None,
        })
    }
}
