use std::env;

use redox_log::{OutputBuilder, RedoxLogger};

/// Environment variable overriding the console log level, e.g. `SOCFPGA_LOG=trace`.
pub const LOG_LEVEL_VAR: &str = "SOCFPGA_LOG";

/// Console log level: `SOCFPGA_LOG` if it holds a valid level, `info` otherwise.
pub fn output_level() -> log::LevelFilter {
    parse_level(env::var(LOG_LEVEL_VAR).ok().as_deref())
}

pub fn file_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

fn parse_level(value: Option<&str>) -> log::LevelFilter {
    match value.map(str::parse::<log::LevelFilter>) {
        Some(Ok(level)) => level,
        Some(Err(_)) => {
            eprintln!("ignoring invalid {LOG_LEVEL_VAR} value, using info");
            log::LevelFilter::Info
        }
        None => log::LevelFilter::Info,
    }
}

/// Configures logging for a single driver.
#[cfg_attr(not(target_os = "redox"), allow(unused_variables, unused_mut))]
pub fn setup_logging(
    category: &str,
    subcategory: &str,
    logfile_base: &str,
    output_level: log::LevelFilter,
    file_level: log::LevelFilter,
) {
    let mut logger = RedoxLogger::new().with_output(
        OutputBuilder::stderr()
            .with_filter(output_level) // limit global output to important info
            .with_ansi_escape_codes()
            .flush_on_newline(true)
            .build(),
    );

    #[cfg(target_os = "redox")]
    for (suffix, ansi) in [("log", false), ("ansi.log", true)] {
        match OutputBuilder::in_redox_logging_scheme(
            category,
            subcategory,
            format!("{logfile_base}.{suffix}"),
        ) {
            Ok(b) => {
                let b = b.with_filter(file_level).flush_on_newline(true);
                let b = if ansi { b.with_ansi_escape_codes() } else { b };
                logger = logger.with_output(b.build());
            }
            Err(error) => eprintln!("Failed to create {logfile_base}.{suffix}: {}", error),
        }
    }

    if let Err(error) = logger.enable() {
        eprintln!("{logfile_base}: failed to set default logger: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::parse_level;

    #[test]
    fn level_from_environment_value() {
        assert_eq!(parse_level(None), log::LevelFilter::Info);
        assert_eq!(parse_level(Some("trace")), log::LevelFilter::Trace);
        assert_eq!(parse_level(Some("WARN")), log::LevelFilter::Warn);
        assert_eq!(parse_level(Some("loud")), log::LevelFilter::Info);
    }
}
