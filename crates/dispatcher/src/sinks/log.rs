//! LogSink - logs bundle summary via tracing

use contracts::{ContractError, DataSink, SynchronizedBundle};
use tracing::{info, instrument};

/// Sink that logs bundle summaries for debugging
pub struct LogSink {
    name: String,
    bundles: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundles: 0,
        }
    }

    fn log_bundle_summary(&self, bundle: &SynchronizedBundle) {
        info!(
            sink = %self.name,
            bundle_id = bundle.bundle_id,
            timestamp = bundle.timestamp,
            cameras = bundle.cameras.len(),
            common_features = bundle.num_common_features(),
            "SynchronizedBundle received"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, bundle_id = bundle.bundle_id)
    )]
    async fn write(&mut self, bundle: &SynchronizedBundle) -> Result<(), ContractError> {
        self.log_bundle_summary(bundle);
        self.bundles += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, bundles = self.bundles, "LogSink closed");
        Ok(())
    }
}
