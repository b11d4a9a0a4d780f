use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;

use crate::linalg_error::{LinAlgError, Result};

/// Console logger at `level`, plus a file logger when `log_file` is given.
/// A second call keeps the first logger: the global logger can be set once.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    // Console logger
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    // File logger
    if let Some(filename) = log_file {
        let file = File::create(filename)
            .map_err(|e| LinAlgError::Settings(format!("cannot create log file {}: {}", filename, e)))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    let _ = CombinedLogger::init(loggers);
    Ok(())
}

/// Parses "off", "error", "warn", "info", "debug" or "trace", any case.
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    name.parse::<LevelFilter>()
        .map_err(|_| LinAlgError::Settings(format!("unknown log level '{}'", name)))
}
