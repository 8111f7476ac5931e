use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Crates whose events follow `--log-level`.
const RADIOHUB_TARGETS: [&str; 5] = [
    "radiohub",
    "radiohub_transport",
    "radiohub_frame",
    "radiohub_endpoint",
    "radiohub_hub",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `level` for the radiohub crates; everything else is capped at `warn`.
fn log_targets(level: LogLevel) -> Targets {
    let level = LevelFilter::from(level);
    RADIOHUB_TARGETS
        .iter()
        .fold(Targets::new(), |targets, &target| targets.with_target(target, level))
        .with_default(level.min(LevelFilter::WARN))
}

/// Install the stderr subscriber. Frame dumps show up at `trace`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let targets = log_targets(level);
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(layer.with_filter(targets))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(targets))
            .try_init(),
    };
}
