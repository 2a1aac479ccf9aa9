// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Installs a graphical [miette](https://docs.rs/miette/latest/miette/index.html) report
//! handler for binaries that embed the input pipeline and return
//! `miette::Result<_>` from `main()`.
//!
//! The hook is lazy: it runs only when a report is actually rendered, so the terminal
//! width is measured at that moment. By then [`TermInput::terminate()`] (or its
//! [`Drop`] impl) has normally restored the terminal, so the report is not mangled by
//! raw mode.
//!
//! [`TermInput::terminate()`]: crate::TermInput::terminate

use miette::MietteHandlerOpts;
use tracing::debug;

/// Used when the terminal size can't be queried (eg: output is piped).
pub const DEFAULT_REPORT_WIDTH: u16 = 80;

/// The [`miette::ErrorHook`] is lazily evaluated.
///
/// The terminal width will be calculated just at the time of the global error handler
/// being used. So if an error never occurs, then the terminal width will never be
/// calculated.
pub fn setup_default_miette_global_report_handler(issues_url: &'static str) {
    miette::set_hook(Box::new(|_report| {
        let terminal_width = {
            let it = crossterm::terminal::size()
                .map_or(DEFAULT_REPORT_WIDTH, |(columns, _rows)| columns);
            debug!("miette::set_hook -> terminal_width: {}", it);
            usize::from(it)
        };
        Box::new(
            MietteHandlerOpts::new()
                .width(terminal_width)
                .wrap_lines(true)
                .unicode(true)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .with_cause_chain()
                .footer(issues_url.to_string())
                .build(),
        )
    }))
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TermInputError;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_hook_renders_term_input_error() {
        setup_default_miette_global_report_handler("https://github.com/r3bl-org/r3bl-open-core/issues");
        let report = miette::Report::new(TermInputError::NotInitialized);
        let rendered = format!("{report:?}");
        assert!(rendered.contains("not initialized"));
    }
}
