use crate::types::{CreatedRecord, FieldAccessor, Notifier, PersistenceClient, RecordFields, ResolvedAsset};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

// A poisoned lock only means another holder panicked; the data is still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// On-disk shape of a record: `{"id": "...", "fields": {"title": "...", ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFixture {
    pub id: String,
    pub fields: IndexMap<String, Value>,
}

/// A record held in memory, fields kept in declaration order.
pub struct InMemoryRecord {
    id: String,
    fields: RwLock<IndexMap<String, Value>>,
}

impl InMemoryRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(IndexMap::new()),
        }
    }

    pub fn with_field(self, field_id: impl Into<String>, value: Value) -> Self {
        write(&self.fields).insert(field_id.into(), value);
        self
    }

    pub fn from_fixture(fixture: RecordFixture) -> Self {
        Self {
            id: fixture.id,
            fields: RwLock::new(fixture.fields),
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading record {}", path.display()))?;
        let fixture: RecordFixture = serde_json::from_str(&content)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn to_fixture(&self) -> RecordFixture {
        RecordFixture {
            id: self.id.clone(),
            fields: read(&self.fields).clone(),
        }
    }
}

#[async_trait]
impl FieldAccessor for InMemoryRecord {
    fn record_id(&self) -> String {
        self.id.clone()
    }

    fn field_ids(&self) -> Vec<String> {
        read(&self.fields).keys().cloned().collect()
    }

    fn has_field(&self, field_id: &str) -> bool {
        read(&self.fields).contains_key(field_id)
    }

    fn get_value(&self, field_id: &str) -> Option<Value> {
        read(&self.fields).get(field_id).cloned()
    }

    async fn set_value(&self, field_id: &str, value: Value) -> Result<()> {
        let mut fields = write(&self.fields);
        match fields.get_mut(field_id) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => bail!("record {} has no field {}", self.id, field_id),
        }
    }
}

/// A record created through [`InMemorySpace::create_record`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub content_type: String,
    pub fields: RecordFields,
}

/// Asset catalog plus created records, standing in for the content store.
#[derive(Default)]
pub struct InMemorySpace {
    assets: HashMap<String, ResolvedAsset>,
    created: RwLock<Vec<StoredRecord>>,
}

impl InMemorySpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, asset: ResolvedAsset) -> Self {
        self.assets.insert(asset.id.clone(), asset);
        self
    }

    /// Load an asset catalog: a JSON list of resolved assets.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading assets {}", path.display()))?;
        let assets: Vec<ResolvedAsset> = serde_json::from_str(&content)?;
        Ok(assets.into_iter().fold(Self::new(), |space, asset| space.with_asset(asset)))
    }

    pub fn created_records(&self) -> Vec<StoredRecord> {
        read(&self.created).clone()
    }
}

#[async_trait]
impl PersistenceClient for InMemorySpace {
    async fn resolve_asset(&self, asset_id: &str) -> Result<ResolvedAsset> {
        self.assets
            .get(asset_id)
            .cloned()
            .ok_or_else(|| anyhow!("asset {} not found", asset_id))
    }

    async fn create_record(&self, content_type: &str, fields: RecordFields) -> Result<CreatedRecord> {
        let id = Uuid::new_v4().to_string();
        write(&self.created).push(StoredRecord {
            id: id.clone(),
            content_type: content_type.to_string(),
            fields,
        });
        Ok(CreatedRecord { id })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Notifier that keeps every message and mirrors it to the log.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: RwLock<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        read(&self.notifications).clone()
    }

    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        read(&self.notifications)
            .iter()
            .filter(|notification| notification.level == level)
            .map(|notification| notification.message.clone())
            .collect()
    }

    fn push(&self, level: NotificationLevel, message: &str) {
        write(&self.notifications).push(Notification {
            level,
            message: message.to_string(),
        });
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        info!("[notify] {}", message);
        self.push(NotificationLevel::Success, message);
    }

    fn warning(&self, message: &str) {
        warn!("[notify] {}", message);
        self.push(NotificationLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        error!("[notify] {}", message);
        self.push(NotificationLevel::Error, message);
    }
}
