use crate::console::ConsoleBackend;
use crate::error::InitError;
use crate::layer::BackendLayer;
use crate::layout::{Layout, DEFAULT_PATTERN};
use crate::sink::{FanOut, LogBackend};
use std::io;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer.
///
/// **Fields**
/// - `min_level`: least severe level forwarded to the backend.
/// - `layout`: pattern used for formatted rendering, see
///   [`Layout`](crate::layout::Layout).
/// - `enable_stdout`: if `true`, records are also printed to stdout by a
///   [`ConsoleBackend`] rendering through the same layout, so console lines
///   and formatted payloads are identical.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: Level,
    pub layout: String,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            layout: DEFAULT_PATTERN.to_string(),
            enable_stdout: true,
        }
    }
}

impl LayerConfig {
    /// Build the [`BackendLayer`] this config describes, printing to stdout
    /// when `enable_stdout` is set.
    pub fn build_layer(&self, backend: Arc<dyn LogBackend>) -> Result<BackendLayer, InitError> {
        self.build_layer_with_writer(backend, io::stdout as fn() -> io::Stdout)
    }

    /// Same as [`build_layer`](Self::build_layer), with console output going
    /// to `make_writer` instead of stdout.
    pub fn build_layer_with_writer<W>(
        &self,
        backend: Arc<dyn LogBackend>,
        make_writer: W,
    ) -> Result<BackendLayer, InitError>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layout = Layout::parse(&self.layout)?;
        let backend: Arc<dyn LogBackend> = if self.enable_stdout {
            // Console first so local output never waits on the broker.
            let console: Arc<dyn LogBackend> = Arc::new(ConsoleBackend::with_writer(make_writer));
            Arc::new(FanOut::new(vec![console, backend]))
        } else {
            backend
        };
        Ok(BackendLayer::new(backend, layout, self.min_level))
    }
}

/// Initialize global `tracing` subscriber using the provided backend and
/// [`LayerConfig`].
///
/// **Parameters**
/// - `backend`: implementation of [`LogBackend`] that will receive every
///   [`LogRecord`](crate::record::LogRecord) at or above `min_level`.
/// - `config`: [`LayerConfig`] controlling filtering and layout.
///
/// **Errors**
/// - [`InitError::Layout`] if the layout pattern does not parse.
/// - [`InitError::SetGlobal`] if a global subscriber is already installed.
pub fn init_tracing_with_config(
    backend: Arc<dyn LogBackend>,
    config: LayerConfig,
) -> Result<(), InitError> {
    let layer = config.build_layer(backend)?;
    tracing::subscriber::set_global_default(Registry::default().with(layer))?;
    Ok(())
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing(backend: Arc<dyn LogBackend>) -> Result<(), InitError> {
    init_tracing_with_config(backend, LayerConfig::default())
}
