mod common;

use common::{init_tracing, ScriptedCaptions, ScriptedSummary};
use metadata_generator::{
    sentinel, AssetReference, CaptionOutcome, DispatchOutput, FieldAssets, FieldCaptions, GenerationDispatcher,
    ResultAggregator, ScannedText, SummaryOutcome, SummaryStatus,
};
use std::sync::Arc;

fn image(asset_id: &str) -> AssetReference {
    AssetReference {
        asset_id: asset_id.to_string(),
        url: format!("https://cdn.example.com/{}.png", asset_id),
        mime_type: "image/png".to_string(),
    }
}

fn field(field_id: &str, asset_ids: &[&str]) -> FieldAssets {
    FieldAssets {
        field_id: field_id.to_string(),
        assets: asset_ids.iter().map(|id| image(id)).collect(),
    }
}

fn url(asset_id: &str) -> String {
    image(asset_id).url
}

#[tokio::test]
async fn test_summary_requested_once_with_scanned_text() {
    init_tracing();
    let summaries = Arc::new(ScriptedSummary::answering("A summary"));
    let captions = Arc::new(ScriptedCaptions::new());
    let dispatcher = GenerationDispatcher::new(summaries.clone(), captions.clone());

    let output = dispatcher
        .dispatch(&ScannedText::Text("Hello\nWorld".to_string()), &[])
        .await;

    assert_eq!(output.summary, SummaryOutcome::Generated("A summary".to_string()));
    assert_eq!(summaries.calls(), vec!["Hello\nWorld".to_string()]);
    assert!(captions.calls().is_empty());
    assert!(output.captions.is_empty());
}

#[tokio::test]
async fn test_empty_text_skips_summary_but_still_captions() {
    init_tracing();
    let summaries = Arc::new(ScriptedSummary::answering("unused"));
    let captions = Arc::new(ScriptedCaptions::new());
    let dispatcher = GenerationDispatcher::new(summaries.clone(), captions.clone());

    let output = dispatcher.dispatch(&ScannedText::Empty, &[field("hero", &["img1"])]).await;

    assert_eq!(output.summary, SummaryOutcome::NoInput);
    assert_eq!(output.summary.text(), sentinel::NO_TEXT_FIELDS);
    assert!(summaries.calls().is_empty());
    assert_eq!(captions.calls(), vec![url("img1")]);
}

#[tokio::test]
async fn test_summary_failure_becomes_sentinel_and_captions_continue() {
    init_tracing();
    let summaries = Arc::new(ScriptedSummary::failing("quota exceeded"));
    let captions = Arc::new(ScriptedCaptions::new());
    let dispatcher = GenerationDispatcher::new(summaries, captions.clone());

    let output = dispatcher
        .dispatch(&ScannedText::Text("text".to_string()), &[field("hero", &["img1"])])
        .await;

    assert!(matches!(output.summary, SummaryOutcome::Failed(ref message) if message.contains("quota")));
    assert_eq!(output.summary.text(), sentinel::SUMMARY_FAILED);
    assert_eq!(output.captions[0].captions, vec![CaptionOutcome::Generated(format!("alt:{}", url("img1")))]);
}

#[tokio::test]
async fn test_blank_answers_become_sentinels() {
    init_tracing();
    let summaries = Arc::new(ScriptedSummary::answering("   "));
    let captions = Arc::new(ScriptedCaptions::new().answer(&url("img1"), "\n"));
    let dispatcher = GenerationDispatcher::new(summaries, captions);

    let output = dispatcher
        .dispatch(&ScannedText::Text("text".to_string()), &[field("hero", &["img1"])])
        .await;

    assert_eq!(output.summary, SummaryOutcome::Blank);
    assert_eq!(output.summary.text(), sentinel::SUMMARY_BLANK);
    assert_eq!(output.captions[0].captions, vec![CaptionOutcome::Blank]);
    assert_eq!(output.captions[0].captions[0].text(), sentinel::CAPTION_BLANK);
}

#[tokio::test]
async fn test_caption_failure_is_isolated_to_one_asset() {
    init_tracing();
    let summaries = Arc::new(ScriptedSummary::answering("summary"));
    let captions = Arc::new(ScriptedCaptions::new().fail(&url("b")));
    let dispatcher = GenerationDispatcher::new(summaries, captions.clone());
    let fields = vec![field("gallery", &["a", "b", "c"]), field("hero", &["d"])];

    let output = dispatcher.dispatch(&ScannedText::Text("text".to_string()), &fields).await;

    assert_eq!(output.captions.len(), 2);
    let gallery = &output.captions[0];
    assert_eq!(gallery.field_id, "gallery");
    assert!(gallery.captions[0].is_generated());
    assert!(matches!(gallery.captions[1], CaptionOutcome::Failed(_)));
    assert_eq!(gallery.captions[1].text(), sentinel::CAPTION_FAILED);
    assert!(gallery.captions[2].is_generated());
    assert_eq!(output.captions[1].captions, vec![CaptionOutcome::Generated(format!("alt:{}", url("d")))]);

    // Sequential by default, in field then list order
    assert_eq!(captions.calls(), vec![url("a"), url("b"), url("c"), url("d")]);
    assert_eq!(captions.max_in_flight(), 1);
}

#[tokio::test]
async fn test_bounded_concurrency_keeps_join_order() {
    init_tracing();
    let summaries = Arc::new(ScriptedSummary::answering("summary"));
    // Earlier assets finish last
    let captions = Arc::new(
        ScriptedCaptions::new()
            .delay(&url("a"), 60)
            .delay(&url("b"), 30)
            .answer(&url("a"), "first")
            .answer(&url("b"), "second")
            .answer(&url("c"), "third"),
    );
    let dispatcher = GenerationDispatcher::new(summaries, captions.clone()).with_concurrency(3);

    let output = dispatcher
        .dispatch(&ScannedText::Empty, &[field("gallery", &["a", "b"]), field("hero", &["c"])])
        .await;

    let texts: Vec<Vec<&str>> = output
        .captions
        .iter()
        .map(|field| field.captions.iter().map(CaptionOutcome::text).collect())
        .collect();
    assert_eq!(texts, vec![vec!["first", "second"], vec!["third"]]);
    assert!(captions.max_in_flight() > 1);
    assert!(captions.max_in_flight() <= 3);
}

#[test]
fn test_aggregate_joins_multi_caption_fields() {
    let output = DispatchOutput {
        summary: SummaryOutcome::Generated("{\"title\":\"T\"}".to_string()),
        captions: vec![
            FieldCaptions {
                field_id: "gallery".to_string(),
                captions: vec![
                    CaptionOutcome::Generated("a".to_string()),
                    CaptionOutcome::Generated("b".to_string()),
                ],
            },
            FieldCaptions {
                field_id: "hero".to_string(),
                captions: vec![CaptionOutcome::Failed("boom".to_string())],
            },
        ],
    };

    let staged = ResultAggregator::aggregate(output);

    assert_eq!(staged.alt_texts.get("gallery").map(String::as_str), Some("a\n\n---\n\nb"));
    assert_eq!(staged.alt_texts.get("hero").map(String::as_str), Some(sentinel::CAPTION_FAILED));
    let keys: Vec<&str> = staged.alt_texts.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["gallery", "hero"]);
    assert_eq!(staged.failed_captions, 1);
    assert!(staged.can_upload_summary());
    assert!(staged.can_upload_alt());
}

#[test]
fn test_aggregate_readiness_flags() {
    let staged = ResultAggregator::aggregate(DispatchOutput {
        summary: SummaryOutcome::NoInput,
        captions: vec![FieldCaptions {
            field_id: "hero".to_string(),
            captions: Vec::new(),
        }],
    });

    let summary = staged.summary.as_ref().expect("summary staged");
    assert_eq!(summary.status, SummaryStatus::NoInput);
    assert_eq!(summary.text, sentinel::NO_TEXT_FIELDS);
    assert!(summary.is_sentinel());
    assert!(staged.alt_texts.is_empty());
    assert!(!staged.can_upload_alt());
    // Nothing here can ever be persisted
    assert!(staged.is_drained());

    let mut staged = staged;
    staged.clear_summary();
    assert!(!staged.can_upload_summary());
    assert!(staged.is_drained());
}
