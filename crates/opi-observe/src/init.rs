use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{
    config::{LoggerConfig, LoggerFormat},
    error::LoggerError,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] if a global subscriber is already set.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(&cfg.level)
        .map_err(|_| LoggerError::InvalidLogLevel(cfg.level.clone()))?;

    tracing_subscriber::registry()
        .with(output(cfg)?)
        .with(filter)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

fn output(cfg: &LoggerConfig) -> Result<BoxedLayer, LoggerError> {
    let layer = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(timer())
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(timer())
            .boxed(),
        LoggerFormat::Journald => journald()?,
    };
    Ok(layer)
}

fn timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald() -> Result<BoxedLayer, LoggerError> {
    tracing_journald::layer()
        .map(Layer::boxed)
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald() -> Result<BoxedLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
