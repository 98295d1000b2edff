use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Structural kind of a field value as read from the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    AssetLink,
    AssetLinkList,
    Other,
}

/// One field of the record open in the editor, captured at scan time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    pub field_id: String,
    pub kind: FieldKind,
    pub raw: Value,
}

impl FieldValue {
    pub fn new(field_id: impl Into<String>, raw: Value) -> Self {
        let kind = classify(&raw);
        Self {
            field_id: field_id.into(),
            kind,
            raw,
        }
    }

    /// The value as text, if it is a string.
    pub fn as_text(&self) -> Option<&str> {
        self.raw.as_str()
    }
}

fn classify(raw: &Value) -> FieldKind {
    match raw {
        Value::String(_) => FieldKind::Text,
        Value::Array(items) if items.iter().any(|item| AssetLink::from_value(item).is_some()) => {
            FieldKind::AssetLinkList
        }
        value if AssetLink::from_value(value).is_some() => FieldKind::AssetLink,
        _ => FieldKind::Other,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkSys {
    #[serde(rename = "type")]
    kind: String,
    link_type: String,
    id: String,
}

#[derive(Deserialize)]
struct LinkMarker {
    sys: LinkSys,
}

/// A reference to an asset, e.g. `{"sys": {"type": "Link", "linkType": "Asset", "id": "img1"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLink {
    pub id: String,
}

impl AssetLink {
    /// Structural check: only links whose link type is `Asset` qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let marker: LinkMarker = serde_json::from_value(value.clone()).ok()?;
        if marker.sys.kind == "Link" && marker.sys.link_type == "Asset" {
            Some(Self { id: marker.sys.id })
        } else {
            None
        }
    }

    /// Build the marker value a host would store in a link field.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "sys": { "type": "Link", "linkType": "Asset", "id": self.id }
        })
    }
}

/// File descriptor of an asset for one locale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    pub url: String,
    pub content_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Asset metadata as returned by the persistence client, keyed by locale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    pub id: String,
    #[serde(default)]
    pub file: HashMap<String, AssetFile>,
}

impl ResolvedAsset {
    pub fn file_for(&self, locale: &str) -> Option<&AssetFile> {
        self.file.get(locale)
    }
}

pub type RecordFields = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
}

/// Field access for the record currently open in the editor.
#[async_trait]
pub trait FieldAccessor: Send + Sync {
    fn record_id(&self) -> String;

    /// Field ids in enumeration order.
    fn field_ids(&self) -> Vec<String>;

    fn has_field(&self, field_id: &str) -> bool;

    fn get_value(&self, field_id: &str) -> Option<Value>;

    async fn set_value(&self, field_id: &str, value: Value) -> Result<()>;

    /// Capture every field in enumeration order. Absent values read as null.
    fn snapshot(&self) -> Vec<FieldValue> {
        self.field_ids()
            .into_iter()
            .map(|field_id| {
                let raw = self.get_value(&field_id).unwrap_or(Value::Null);
                FieldValue::new(field_id, raw)
            })
            .collect()
    }
}

/// Content store behind the editor.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn resolve_asset(&self, asset_id: &str) -> Result<ResolvedAsset>;

    async fn create_record(&self, content_type: &str, fields: RecordFields) -> Result<CreatedRecord>;
}

/// Generative text service. Output is plain text or a JSON-shaped string,
/// depending on how the prompt variant was configured.
#[async_trait]
pub trait SummaryService: Send + Sync {
    fn service_name(&self) -> String;

    async fn generate_summary(&self, text: &str) -> Result<String>;
}

/// Image captioning service producing short alt text.
#[async_trait]
pub trait CaptionService: Send + Sync {
    fn service_name(&self) -> String;

    async fn generate_caption(&self, url: &str, mime_type: &str) -> Result<String>;
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Picks the locale whose file descriptor is read when resolving an asset.
pub trait LocaleResolver: Send + Sync {
    fn locale(&self, field_id: &str) -> String;
}
