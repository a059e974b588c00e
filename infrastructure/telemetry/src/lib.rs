mod config;

pub use self::config::*;

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

/// Install the global subscriber: one filter, then console and file outputs with their own
/// filters. Fails if a global subscriber is already set.
pub fn initialize_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    if !config.enable {
        return Ok(());
    }
    let console = config.console.enable.then(|| {
        let debug = config.console.enable_debug_logging;
        tracing_subscriber::fmt::layer()
            .with_file(debug)
            .with_line_number(debug)
            .with_thread_ids(debug)
            .with_target(debug)
            .with_filter(config.console.filter.build())
    });
    let file = config.file.enable.then(|| {
        let file_config = &config.file;
        let debug = file_config.enable_debug_logging;
        let appender = RollingFileAppender::new(
            file_config.rolling_time.clone().into(),
            &file_config.path,
            &file_config.prefix,
        );
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(appender)
            .with_file(debug)
            .with_line_number(debug)
            .with_thread_ids(debug)
            .with_target(debug)
            .with_filter(file_config.filter.build())
    });
    Registry::default()
        .with(config.filter.build())
        .with(console)
        .with(file)
        .try_init()?;
    Ok(())
}
