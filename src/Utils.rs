//! utility modules used throughout the project
/// console and file logging through simplelog
pub mod logger;
/// thresholds and solver parameters, loadable from a TOML file
pub mod settings;
