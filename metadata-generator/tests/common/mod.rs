#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use metadata_generator::{
    AssetFile, CaptionService, FieldAccessor, InMemoryRecord, ResolvedAsset, SummaryService,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Asset-link marker as stored in a link field.
pub fn link(asset_id: &str) -> Value {
    json!({ "sys": { "type": "Link", "linkType": "Asset", "id": asset_id } })
}

/// Asset with a single `en-US` file.
pub fn asset(asset_id: &str, url: &str, content_type: &str) -> ResolvedAsset {
    let mut file = HashMap::new();
    file.insert(
        "en-US".to_string(),
        AssetFile {
            url: url.to_string(),
            content_type: content_type.to_string(),
            file_name: None,
        },
    );
    ResolvedAsset {
        id: asset_id.to_string(),
        file,
    }
}

/// Summary service returning a fixed answer and recording every request.
pub struct ScriptedSummary {
    response: std::result::Result<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSummary {
    pub fn answering(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryService for ScriptedSummary {
    fn service_name(&self) -> String {
        "scripted summary".to_string()
    }

    async fn generate_summary(&self, text: &str) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());
        self.response.clone().map_err(|message| anyhow!(message))
    }
}

/// Caption service answering `alt:<url>` unless scripted otherwise.
#[derive(Default)]
pub struct ScriptedCaptions {
    responses: HashMap<String, std::result::Result<String, String>>,
    delays_ms: HashMap<String, u64>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedCaptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, url: &str, caption: &str) -> Self {
        self.responses.insert(url.to_string(), Ok(caption.to_string()));
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Err(format!("model refused {}", url)));
        self
    }

    pub fn delay(mut self, url: &str, delay_ms: u64) -> Self {
        self.delays_ms.insert(url.to_string(), delay_ms);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptionService for ScriptedCaptions {
    fn service_name(&self) -> String {
        "scripted captions".to_string()
    }

    async fn generate_caption(&self, url: &str, _mime_type: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delays_ms.get(url) {
            tokio::time::sleep(tokio::time::Duration::from_millis(*delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.responses.get(url) {
            Some(Ok(caption)) => Ok(caption.clone()),
            Some(Err(message)) => Err(anyhow!(message.clone())),
            None => Ok(format!("alt:{}", url)),
        }
    }
}

/// Record whose writes to the listed fields fail.
pub struct FlakyRecord {
    inner: InMemoryRecord,
    broken: Vec<String>,
}

impl FlakyRecord {
    pub fn new(inner: InMemoryRecord, broken: &[&str]) -> Self {
        Self {
            inner,
            broken: broken.iter().map(|field| field.to_string()).collect(),
        }
    }
}

#[async_trait]
impl FieldAccessor for FlakyRecord {
    fn record_id(&self) -> String {
        self.inner.record_id()
    }

    fn field_ids(&self) -> Vec<String> {
        self.inner.field_ids()
    }

    fn has_field(&self, field_id: &str) -> bool {
        self.inner.has_field(field_id)
    }

    fn get_value(&self, field_id: &str) -> Option<Value> {
        self.inner.get_value(field_id)
    }

    async fn set_value(&self, field_id: &str, value: Value) -> Result<()> {
        if self.broken.iter().any(|broken| broken == field_id) {
            bail!("write to {} rejected", field_id);
        }
        self.inner.set_value(field_id, value).await
    }
}
