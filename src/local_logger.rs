use std::io::Write;

use crate::prelude::*;
use console::Style;
use log::Log;
use simplelog::{CombinedLogger, SharedLogger};

pub const BITRISE_U8_COLOR_CODE: u8 = 93; // #8700FF

/// Parse a `--loglevel` value. `fatal` and `panic` are kept as aliases of `error` for
/// compatibility with the levels accepted by the Bitrise CLI.
pub fn parse_log_level(value: &str) -> Result<log::LevelFilter, String> {
    match value.to_ascii_lowercase().as_str() {
        "fatal" | "panic" => Ok(log::LevelFilter::Error),
        other => other.parse::<log::LevelFilter>().map_err(|_| {
            format!("Invalid log level '{value}' (options: trace, debug, info, warn, error)")
        }),
    }
}

pub struct LocalLogger {
    log_level: log::LevelFilter,
}

impl LocalLogger {
    pub fn new(log_level: log::LevelFilter) -> Self {
        LocalLogger { log_level }
    }
}

impl Log for LocalLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.log_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        print_record(record);
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

const CRATE_TARGET_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

fn level_style(level: log::Level) -> Style {
    match level {
        log::Level::Error => Style::new().red(),
        log::Level::Warn => Style::new().yellow(),
        log::Level::Info => Style::new().white(),
        log::Level::Debug => Style::new().color256(BITRISE_U8_COLOR_CODE).dim(),
        log::Level::Trace => Style::new().black().bright().dim(),
    }
}

/// Debug and trace lines are tagged with the emitting module, relative to the crate root
fn format_line(level: log::Level, target: &str, message: impl std::fmt::Display) -> String {
    let module = target.strip_prefix(CRATE_TARGET_PREFIX).unwrap_or(target);
    match level {
        log::Level::Debug | log::Level::Trace => {
            format!("{} {module}: {message}", level.as_str().to_ascii_lowercase())
        }
        _ => message.to_string(),
    }
}

fn print_record(record: &log::Record) {
    let line = level_style(record.level()).apply_to(format_line(
        record.level(),
        record.target(),
        record.args(),
    ));
    match record.level() {
        log::Level::Error | log::Level::Warn => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

impl SharedLogger for LocalLogger {
    fn level(&self) -> log::LevelFilter {
        self.log_level
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

pub fn init_local_logger(log_level: log::LevelFilter) -> Result<()> {
    let logger: Box<dyn SharedLogger> = Box::new(LocalLogger::new(log_level));
    CombinedLogger::init(vec![logger])?;
    Ok(())
}
