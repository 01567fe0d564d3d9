/// Host-provided sink surfacing control-plane events to whatever UI the host
/// owns. Reload successes and failures are mirrored here so a human watching
/// the host can see them without polling.
pub trait NotificationSink: Send {
    fn publish_info(&mut self, text: &str);
    fn publish_success(&mut self, text: &str);
    fn publish_error(&mut self, text: &str);
}

/// Sink that drops everything. Useful for headless embedders and tests.
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish_info(&mut self, _text: &str) {}
    fn publish_success(&mut self, _text: &str) {}
    fn publish_error(&mut self, _text: &str) {}
}
