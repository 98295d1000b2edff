use crate::types::FieldValue;
use tracing::debug;

/// Text gathered from the record for the summary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedText {
    /// No field held a non-blank string.
    Empty,
    Text(String),
}

impl ScannedText {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScannedText::Empty => None,
            ScannedText::Text(text) => Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ScannedText::Empty)
    }
}

/// Collects plain text from record fields in enumeration order.
pub struct FieldScanner;

impl FieldScanner {
    pub fn scan(fields: &[FieldValue]) -> ScannedText {
        let mut collected = String::new();
        let mut used = 0;

        for field in fields {
            let Some(value) = field.as_text() else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            collected.push_str(value);
            collected.push('\n');
            used += 1;
        }

        let text = collected.trim();
        debug!("Scanned {} fields, {} contributed text", fields.len(), used);

        if text.is_empty() {
            ScannedText::Empty
        } else {
            ScannedText::Text(text.to_string())
        }
    }
}
