//! Dispatcher - fan-out of synchronized bundles to sinks

use tracing::{debug, info, instrument};

use contracts::{SinkConfig, SinkType, SyncedDataset, SynchronizedBundle};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Per-sink outcome of a dispatch run
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Bundles handed to the sinks
    pub bundles: u64,
    /// Final metrics by sink name
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl DispatchReport {
    /// Total failed writes across all sinks
    pub fn failures(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.failure_count).sum()
    }
}

/// Fans bundles out to every configured sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    bundle_count: u64,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self {
            handles,
            bundle_count: 0,
        }
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.handles.iter().map(SinkHandle::name).collect()
    }

    /// Send one bundle to every sink
    pub async fn dispatch(&mut self, bundle: &SynchronizedBundle) -> Result<(), DispatcherError> {
        for handle in &self.handles {
            handle.send(bundle.clone()).await?;
        }
        self.bundle_count += 1;
        if self.bundle_count.is_multiple_of(100) {
            debug!(bundles = self.bundle_count, "Dispatcher progress");
        }
        Ok(())
    }

    /// Send every bundle of `dataset`, then shut the sinks down.
    #[instrument(
        name = "dispatcher_run",
        skip(self, dataset),
        fields(bundles = dataset.len(), sinks = self.handles.len())
    )]
    pub async fn run(mut self, dataset: &SyncedDataset) -> Result<DispatchReport, DispatcherError> {
        info!(sinks = self.handles.len(), "Dispatcher started");

        for bundle in dataset.bundles() {
            self.dispatch(&bundle).await?;
        }

        Ok(self.shutdown().await)
    }

    /// Drain every sink and collect final metrics
    pub async fn shutdown(self) -> DispatchReport {
        let mut sinks = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            sinks.push((name, handle.shutdown().await));
        }

        info!(bundles = self.bundle_count, "Dispatcher shutdown complete");
        DispatchReport {
            bundles: self.bundle_count,
            sinks,
        }
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Create a dispatcher from sink configs (must run inside a tokio runtime)
#[instrument(name = "dispatcher_create", skip(sink_configs), fields(sink_count = sink_configs.len()))]
pub fn create_dispatcher(sink_configs: &[SinkConfig]) -> Result<Dispatcher, DispatcherError> {
    let handles = sink_configs
        .iter()
        .map(create_sink_handle)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Dispatcher::with_handles(handles))
}
