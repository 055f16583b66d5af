use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::path::Path;

fn logger_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("verstamp")
        .build()
}

/// Log to stderr, and to `log_file` when given.
///
/// A log file that cannot be opened is reported and skipped.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) {
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(error) => eprintln!(
                "warning: cannot open log file {}: {error}",
                path.display()
            ),
        }
    }

    let _ = CombinedLogger::init(loggers);
}
