pub mod baseline;
pub mod defs;
pub mod empty;

pub use baseline::{FixedLocale, DEFAULT_LOCALE};
pub use empty::SilentNotifier;
