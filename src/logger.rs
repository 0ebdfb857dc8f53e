use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initializes logging from a log4rs YAML config file.
///
/// # Errors
/// Returns an error if the file cannot be read or describes an invalid config.
pub fn init_file(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Build the console logging config for a level name (error|warn|info|debug|trace).
///
/// The operator trace target only reaches the console when the level is `trace`.
///
/// # Errors
/// Returns an error if log4rs rejects the config.
pub fn console_config(level: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level);
    let stderr = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let trace_level = if lvl == LevelFilter::Trace { LevelFilter::Trace } else { LevelFilter::Off };
    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(stderr)))
        .logger(
            Logger::builder()
                .appender("console")
                .additive(false)
                .build(crate::trace::TRACE_TARGET, trace_level),
        )
        .build(Root::builder().appender("console").build(lvl))?;
    Ok(config)
}

/// Configure console logging for the process. A second call is ignored by log4rs.
pub fn configure_logging(level: Option<&str>) {
    match console_config(level) {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(e) => eprintln!("docops: logging not configured: {e}"),
    }
}

/// Configure logging from `DOCOPS_LOG_LEVEL` if present.
pub fn configure_from_env() {
    let level = std::env::var("DOCOPS_LOG_LEVEL").ok();
    configure_logging(level.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level(Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("bogus")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }

    #[test]
    fn console_config_builds() {
        let cfg = console_config(Some("trace")).unwrap();
        assert_eq!(cfg.root().level(), LevelFilter::Trace);
        assert!(cfg.loggers().iter().any(|l| l.name() == crate::trace::TRACE_TARGET));
    }
}
