// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing_core::LevelFilter;

/// Default log file used by [`TracingConfig::new_file()`] when no name is supplied.
pub const DEFAULT_LOG_FILE_NAME: &str = "term_input_log_file_debug.log";

/// Configure the tracing logging to suit your needs. You can display the logs to a:
/// 1. file,
/// 2. stdout or stderr,
/// 3. both.
///
/// While the terminal is in raw mode, anything written to stdout or stderr lands in the
/// middle of the user's screen (and `\n` may not return the carriage, depending on the
/// [`RawModeFlavor`]). Prefer [`WriterConfig::File`] for applications that run the
/// input pipeline.
///
/// Fields:
/// - `writer_config`: [`WriterConfig`] to choose where to write the logs.
/// - `level`: [`tracing::Level`] - The log level to use for tracing.
///
/// [`RawModeFlavor`]: crate::RawModeFlavor
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level: tracing::Level,
}

/// - `tracing_log_file_path_and_prefix`: [String] is the file path and prefix to use for
///   the log file. Eg: `/tmp/term_input` or `term_input`.
/// - `DisplayPreference`: [`DisplayPreference`] is the preferred display to use for
///   logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    None,
    Display(DisplayPreference),
    File(String /* tracing_log_file_path_and_prefix */),
    DisplayAndFile(
        DisplayPreference,
        String, /* tracing_log_file_path_and_prefix */
    ),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
}

impl TracingConfig {
    /// Log to both the given [`DisplayPreference`] and a file.
    #[must_use]
    pub fn new_file_and_display(
        filename: Option<String>,
        preferred_display: DisplayPreference,
    ) -> Self {
        Self {
            writer_config: WriterConfig::DisplayAndFile(
                preferred_display,
                filename.unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string()),
            ),
            level: tracing::Level::DEBUG,
        }
    }

    #[must_use]
    pub fn new_display(preferred_display: DisplayPreference) -> Self {
        Self {
            writer_config: WriterConfig::Display(preferred_display),
            level: tracing::Level::DEBUG,
        }
    }

    #[must_use]
    pub fn new_file(filename: Option<String>) -> Self {
        Self {
            writer_config: WriterConfig::File(
                filename.unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string()),
            ),
            level: tracing::Level::DEBUG,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn get_writer_config(&self) -> WriterConfig { self.writer_config.clone() }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { LevelFilter::from_level(self.level) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_file_uses_default_name() {
        let config = TracingConfig::new_file(None);
        assert_eq!(
            config.get_writer_config(),
            WriterConfig::File(DEFAULT_LOG_FILE_NAME.to_string())
        );
        assert_eq!(config.get_level_filter(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_with_level_overrides_filter() {
        let config = TracingConfig::new_display(DisplayPreference::Stderr)
            .with_level(tracing::Level::WARN);
        assert_eq!(config.get_level_filter(), LevelFilter::WARN);
        assert_eq!(
            config.get_writer_config(),
            WriterConfig::Display(DisplayPreference::Stderr)
        );
    }
}
