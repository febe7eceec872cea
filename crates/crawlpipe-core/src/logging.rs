//! Logging setup: env_logger, routed through indicatif when a spinner is live

use indicatif::MultiProgress;

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// `[LEVEL] message`, with the emitting module at debug and trace level
fn format_line(record: &log::Record, color: bool) -> String {
    let (pre, label, post) = level_style(record.level(), color);
    if record.level() >= log::Level::Debug {
        let target = record.target().strip_prefix("crawlpipe_").unwrap_or(record.target());
        format!("[{pre}{label}{post}] {target}: {}", record.args())
    } else {
        format!("[{pre}{label}{post}] {}", record.args())
    }
}

/// Logger that prints through indicatif MultiProgress so lines do not tear
/// the document counter.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            let line = format_line(record, true);
            self.multi.suspend(|| eprintln!("{line}"));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize logging. `RUST_LOG` overrides the level chosen by the flags.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let default_level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let env = env_logger::Env::default().default_filter_or(default_level);

    if let Some(multi) = multi {
        let logger = env_logger::Builder::from_env(env).build();
        let max_level = logger.filter();
        if log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone()))).is_ok() {
            log::set_max_level(max_level);
        }
    } else {
        // Non-TTY: no ANSI colors
        let _ = env_logger::Builder::from_env(env)
            .format(|buf, record| writeln!(buf, "{}", format_line(record, false)))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels_are_padded() {
        assert_eq!(level_style(log::Level::Warn, false), ("", "WARN ", ""));
        assert_eq!(level_style(log::Level::Info, false).1.len(), 5);
    }

    #[test]
    fn colored_labels_reset() {
        let (pre, _, post) = level_style(log::Level::Error, true);
        assert_eq!(pre, "\x1b[31m");
        assert_eq!(post, "\x1b[0m");
    }

    #[test]
    fn debug_lines_carry_target() {
        let line = format_line(
            &log::Record::builder()
                .args(format_args!("opening file"))
                .level(log::Level::Debug)
                .target("crawlpipe_core::files")
                .build(),
            false,
        );
        assert_eq!(line, "[DEBUG] core::files: opening file");
    }

    #[test]
    fn info_lines_have_no_target() {
        let line = format_line(
            &log::Record::builder()
                .args(format_args!("streaming"))
                .level(log::Level::Info)
                .target("crawlpipe_core::files")
                .build(),
            false,
        );
        assert_eq!(line, "[INFO ] streaming");
    }
}
