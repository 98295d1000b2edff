use crate::defs::Notifier;

/// Notifier for hosts without a notification surface.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn success(&self, _message: &str) {
        // Nothing to show, the log already has it.
    }

    fn warning(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
