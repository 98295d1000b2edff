use crate::types::{AssetLink, FieldKind, FieldValue, LocaleResolver, PersistenceClient};
use crate::utils::url::normalize_asset_url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An image asset ready for captioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReference {
    pub asset_id: String,
    pub url: String,
    pub mime_type: String,
}

/// Image assets of one field, in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAssets {
    pub field_id: String,
    pub assets: Vec<AssetReference>,
}

/// Turns asset-link fields into image references.
pub struct AssetResolver {
    persistence: Arc<dyn PersistenceClient>,
    locales: Arc<dyn LocaleResolver>,
}

impl AssetResolver {
    pub fn new(persistence: Arc<dyn PersistenceClient>, locales: Arc<dyn LocaleResolver>) -> Self {
        Self { persistence, locales }
    }

    /// Resolve every asset link on the record. Fields without a single
    /// qualifying image are left out.
    pub async fn resolve(&self, fields: &[FieldValue]) -> Vec<FieldAssets> {
        let mut resolved = Vec::new();

        for field in fields {
            let elements: Vec<&Value> = match (field.kind, &field.raw) {
                (FieldKind::AssetLink, single) => vec![single],
                (FieldKind::AssetLinkList, Value::Array(items)) => items.iter().collect(),
                _ => continue,
            };

            let mut assets = Vec::new();
            for element in elements {
                let Some(link) = AssetLink::from_value(element) else {
                    continue;
                };
                if let Some(reference) = self.resolve_link(&field.field_id, &link).await {
                    assets.push(reference);
                }
            }

            if !assets.is_empty() {
                debug!("Field {} has {} image assets", field.field_id, assets.len());
                resolved.push(FieldAssets {
                    field_id: field.field_id.clone(),
                    assets,
                });
            }
        }

        info!(
            "Resolved {} image assets across {} fields",
            resolved.iter().map(|field| field.assets.len()).sum::<usize>(),
            resolved.len()
        );
        resolved
    }

    async fn resolve_link(&self, field_id: &str, link: &AssetLink) -> Option<AssetReference> {
        let asset = match self.persistence.resolve_asset(&link.id).await {
            Ok(asset) => asset,
            Err(e) => {
                // Skip this asset only, siblings keep going
                warn!("Failed to resolve asset {} in field {}: {}", link.id, field_id, e);
                return None;
            }
        };

        let locale = self.locales.locale(field_id);
        let Some(file) = asset.file_for(&locale) else {
            debug!("Asset {} has no file for locale {}", link.id, locale);
            return None;
        };

        if !file.content_type.starts_with("image/") {
            debug!("Asset {} is {}, not an image", link.id, file.content_type);
            return None;
        }

        match normalize_asset_url(&file.url) {
            Some(url) => Some(AssetReference {
                asset_id: link.id.clone(),
                url,
                mime_type: file.content_type.clone(),
            }),
            None => {
                warn!("Asset {} has an unusable url: {}", link.id, file.url);
                None
            }
        }
    }
}
