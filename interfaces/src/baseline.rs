use crate::defs::LocaleResolver;

pub const DEFAULT_LOCALE: &str = "en-US";

/// Resolves every field to the same locale.
#[derive(Clone, Debug)]
pub struct FixedLocale {
    locale: String,
}

impl FixedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }
}

impl Default for FixedLocale {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl LocaleResolver for FixedLocale {
    fn locale(&self, _field_id: &str) -> String {
        self.locale.clone()
    }
}
