use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Crate emitting per-byte stream decoding events.
const FRAME_TARGET: &str = "vrlink_frame";

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

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Filter for stderr logging.
///
/// vrlink crates follow `level`. Stream decoding in the frame crate only
/// shows at `trace`, so `debug` stays one line per frame sent or received.
/// Other crates are capped at `warn`.
pub fn targets(level: LogLevel) -> Targets {
    let filter = level.as_filter();
    let frame = match level {
        LogLevel::Trace => LevelFilter::TRACE,
        _ => filter.min(LevelFilter::INFO),
    };

    Targets::new()
        .with_default(filter.min(LevelFilter::WARN))
        .with_target("vrlink", filter)
        .with_target(FRAME_TARGET, frame)
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(matches!(level, LogLevel::Debug | LogLevel::Trace));
    let registry = tracing_subscriber::registry();

    let _ = match format {
        LogFormat::Text => registry.with(layer.with_filter(targets(level))).try_init(),
        LogFormat::Json => registry
            .with(layer.json().with_filter(targets(level)))
            .try_init(),
    };
}
