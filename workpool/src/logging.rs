// Logging for workpool
//
// Thin setup layer over the `tracing` ecosystem. The pool itself only emits
// `tracing` events (pool lifecycle at INFO, worker lifecycle at DEBUG, task
// dispatch at TRACE, task failures at ERROR through `TracingReporter`);
// installing a subscriber is left to the application, and this module offers
// the usual presets.
//
// ```rust
// use workpool::logging;
//
// // INFO level, human-readable console output
// logging::init_default();
//
// // Or pick the fields yourself
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: true,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// Only the first initialization in a process takes effect.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, registry::LookupSpan, EnvFilter, Layer};

/// Configuration for the workpool logging setup
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id; worker threads are named after the pool
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

static INIT: Once = Once::new();

/// Install the global subscriber described by `config`.
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::registry()
            .with(build_filter(&config))
            .with(console_layer(&config));

        if let Err(err) = subscriber.try_init() {
            eprintln!("Error setting global tracing subscriber: {}", err);
        }
    });
}

/// Install a subscriber writing both to the console and to `log_file`.
///
/// The file is opened in append mode and created if missing. File output is
/// always plain text without colours. If logging was already initialized this
/// is a no-op and the file is not touched.
///
/// # Errors
/// Returns an error if the file cannot be opened or created.
pub fn init_with_file(config: LogConfig, log_file: impl AsRef<Path>) -> io::Result<()> {
    if INIT.is_completed() {
        return Ok(());
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    INIT.call_once(move || {
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(build_filter(&config))
            .with(console_layer(&config))
            .with(file_layer);

        if let Err(err) = subscriber.try_init() {
            eprintln!("Error setting global tracing subscriber: {}", err);
        }
    });

    Ok(())
}

/// INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// DEBUG everywhere and TRACE for the worker threads, so every task dispatch
/// is visible.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        target_filters: Some("workpool=debug,workpool::thread=trace".to_string()),
        ..Default::default()
    });
}

/// JSON output for log aggregators, without file/line information.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.trim().parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }

    env_filter
}

fn console_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_file(config.show_file_line)
        .with_line_number(config.show_file_line)
        .with_thread_names(config.show_thread_info)
        .with_thread_ids(config.show_thread_info);

    match (config.json_format, config.show_time) {
        (true, true) => layer.json().flatten_event(true).boxed(),
        (true, false) => layer.json().flatten_event(true).without_time().boxed(),
        (false, true) => layer.boxed(),
        (false, false) => layer.without_time().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_includes_target_directives() {
        let config = LogConfig {
            target_filters: Some("workpool=debug, workpool::thread=trace".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&config).to_string();
        assert!(filter.contains("workpool=debug"));
        assert!(filter.contains("workpool::thread=trace"));
    }

    #[test]
    fn test_init_with_file_after_init_leaves_file_alone() {
        init_default();

        let path = std::env::temp_dir().join(format!("workpool-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);
        init_with_file(LogConfig::default(), &path).unwrap();

        assert!(!path.exists());
    }
}
