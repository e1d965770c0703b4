//! Process-wide logger. Records go to stderr as single lines so that stdout
//! stays reserved for command output.

use env_logger::fmt::Formatter;
use log::{LevelFilter, Record};
use std::io::{self, Write};

const CRATE_PREFIX: &str = "setlog::";

pub fn init_logger(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .format(write_record)
        .target(env_logger::Target::Stderr)
        .filter_level(level)
        .try_init();

    log::set_max_level(level);
}

/// `2025-06-01T18:30:00Z WARN  session::session | message`
fn write_record(buf: &mut Formatter, record: &Record) -> io::Result<()> {
    writeln!(
        buf,
        "{} {:<5} {} | {}",
        buf.timestamp_seconds(),
        record.level(),
        short_target(record.target()),
        record.args()
    )
}

fn short_target(target: &str) -> &str {
    target.strip_prefix(CRATE_PREFIX).unwrap_or(target)
}

/// Accepts the `log` level names in any case, plus `warning`.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::Warn),
        other => other.parse().ok(),
    }
}

pub fn set_log_level(level: &str) -> bool {
    parse_level(level).map(init_logger).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("WARNING"), Some(LevelFilter::Warn));
        assert_eq!(parse_level(" trace "), Some(LevelFilter::Trace));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(!set_log_level("loud"));
    }

    #[test]
    fn crate_targets_are_shortened() {
        assert_eq!(short_target("setlog::session::workout"), "session::workout");
        assert_eq!(short_target("diesel_migrations"), "diesel_migrations");
    }
}
