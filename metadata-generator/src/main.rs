use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use interfaces::FixedLocale;
use metadata_generator::{
    GeneratorConfig, InMemoryRecord, InMemorySpace, MockCaptionService, MockSummaryService, PipelineBuilder,
    RecordingNotifier, ResponseFormat, SummaryShape, UploadTarget,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShapeArg {
    Plain,
    Structured,
}

/// Generate SEO metadata and alt text for a record, using offline mock services.
#[derive(Debug, Parser)]
#[command(name = "metadata-generator", version)]
struct Args {
    /// Record fixture: {"id": "...", "fields": {...}}
    #[arg(long)]
    record: PathBuf,

    /// Asset catalog: a JSON list of resolved assets
    #[arg(long)]
    assets: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ShapeArg::Structured)]
    shape: ShapeArg,

    /// Only accept bare JSON summaries (no code fence)
    #[arg(long)]
    strict_json: bool,

    #[arg(long, default_value = "en-US")]
    locale: String,

    /// Parallel caption requests
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Content type of the record created for the summary
    #[arg(long, default_value = "seoMetadata")]
    content_type: String,

    /// Write the summary onto the source record instead of a new one
    #[arg(long)]
    upload_to_source: bool,

    /// Upload both result classes after generating
    #[arg(long)]
    upload: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let shape = match args.shape {
        ShapeArg::Plain => SummaryShape::PlainText,
        ShapeArg::Structured => SummaryShape::Structured,
    };
    let config = GeneratorConfig {
        summary_shape: shape,
        response_format: if args.strict_json {
            ResponseFormat::Json
        } else {
            ResponseFormat::FencedJson
        },
        upload_target: if args.upload_to_source {
            UploadTarget::SourceRecord
        } else {
            UploadTarget::NewRecord {
                content_type: args.content_type.clone(),
            }
        },
        caption_concurrency: args.concurrency,
        ..GeneratorConfig::default()
    };

    let record = Arc::new(InMemoryRecord::load(&args.record).await?);
    let space = Arc::new(match &args.assets {
        Some(path) => InMemorySpace::load(path).await?,
        None => InMemorySpace::new(),
    });
    let notifier = Arc::new(RecordingNotifier::new());

    let mut summaries = MockSummaryService::new("cli".to_string(), shape);
    if args.strict_json {
        summaries = summaries.unfenced();
    }

    let mut pipeline = PipelineBuilder::new(record.clone())
        .persistence(space.clone())
        .summary_service(Arc::new(summaries))
        .caption_service(Arc::new(MockCaptionService::new("cli".to_string())))
        .notifier(notifier.clone())
        .locale_resolver(Arc::new(FixedLocale::new(args.locale.clone())))
        .config(config)
        .build()?;

    info!("Starting metadata generation for {}", args.record.display());

    let staged = pipeline.generate().await?;
    println!("{}", serde_json::to_string_pretty(staged)?);

    match pipeline.preview() {
        Some(Ok(summary)) => info!("Parsed summary: {} ({} tags)", summary.title, summary.tags.len()),
        Some(Err(e)) => error!("Could not parse summary: {}", e),
        None => {}
    }

    if !args.upload {
        return Ok(());
    }

    if pipeline.can_upload_summary() {
        match pipeline.upload_summary().await {
            Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            Err(e) => error!("Summary upload failed: {}", e),
        }
    }

    if pipeline.can_upload_alt() {
        let report = pipeline.upload_alt_texts().await.context("uploading alt text")?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    println!("{}", serde_json::to_string_pretty(&space.created_records())?);
    println!("{}", serde_json::to_string_pretty(&record.to_fixture())?);
    info!("Finished with session {}, {} notifications", pipeline.state(), notifier.notifications().len());

    Ok(())
}
