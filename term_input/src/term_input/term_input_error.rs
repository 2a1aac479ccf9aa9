// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::ErrorKind;

/// Errors returned by [`TermInput`](crate::TermInput).
///
/// | Variant                  | Raised by                         | Recoverable?              |
/// | :----------------------- | :-------------------------------- | :------------------------ |
/// | [`NotInitialized`]       | reads before `initialize()`       | call `initialize()`       |
/// | [`StreamRead`]           | reads after the input stream died | fresh `initialize()`      |
/// | [`Terminated`]           | reads after terminate / signal    | fresh `initialize()`      |
/// | [`Timeout`]              | blocking read with a timeout      | yes, retry                |
/// | [`NoDataAvailable`]      | non-blocking read                 | yes, retry                |
/// | [`TerminalMode`]         | `initialize()`, `terminate()`     | maybe                     |
/// | [`SourceRegistration`]   | `initialize()`                    | maybe                     |
/// | [`ThreadSpawn`]          | `initialize()`                    | maybe                     |
/// | [`MutexPoisoned`]        | any                               | no                        |
///
/// A producer-side drop on a full buffer is deliberately not an error; bytes typed
/// faster than they are consumed are shed silently.
///
/// [`MutexPoisoned`]: Self::MutexPoisoned
/// [`NoDataAvailable`]: Self::NoDataAvailable
/// [`NotInitialized`]: Self::NotInitialized
/// [`SourceRegistration`]: Self::SourceRegistration
/// [`StreamRead`]: Self::StreamRead
/// [`TerminalMode`]: Self::TerminalMode
/// [`Terminated`]: Self::Terminated
/// [`ThreadSpawn`]: Self::ThreadSpawn
/// [`Timeout`]: Self::Timeout
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TermInputError {
    #[error("Terminal input pipeline is not initialized")]
    #[diagnostic(
        code(r3bl_term_input::not_initialized),
        help("Call `TermInput::initialize()` before reading")
    )]
    NotInitialized,

    #[error("Reading the terminal input stream failed ({kind})")]
    #[diagnostic(
        code(r3bl_term_input::stream_read),
        help(
            "The input stream closed or errored. The terminal has been restored; \
             call `TermInput::initialize()` to start a new session"
        )
    )]
    StreamRead { kind: ErrorKind },

    #[error("Terminal input pipeline was terminated")]
    #[diagnostic(code(r3bl_term_input::terminated))]
    Terminated,

    #[error("Timed out waiting for terminal input")]
    #[diagnostic(code(r3bl_term_input::timeout), help("Retry the read"))]
    Timeout,

    #[error("No terminal input available")]
    #[diagnostic(code(r3bl_term_input::no_data_available), help("Retry the read"))]
    NoDataAvailable,

    /// The inner [`miette::Report`] carries the OS error chain.
    #[error("Failed to change terminal mode")]
    #[diagnostic(
        code(r3bl_term_input::terminal_mode),
        help("Ensure the process has a controlling terminal")
    )]
    TerminalMode(miette::Report),

    /// The inner [`miette::Report`] carries the OS error chain, for example
    /// [`PollCreationError`](crate::PollCreationError).
    #[error("Failed to register input sources")]
    #[diagnostic(code(r3bl_term_input::source_registration))]
    #[cfg_attr(
        target_os = "linux",
        diagnostic(help(
            "Check OS resource limits - \
             use `ulimit -n` for file descriptors"
        ))
    )]
    #[cfg_attr(
        target_os = "macos",
        diagnostic(help(
            "Check OS resource limits - \
             use `launchctl limit maxfiles` for file descriptors"
        ))
    )]
    SourceRegistration(miette::Report),

    #[error("Failed to spawn the input collector thread")]
    #[diagnostic(
        code(r3bl_term_input::thread_spawn),
        help("The system may have reached its thread limit")
    )]
    ThreadSpawn(#[source] std::io::Error),

    #[error("Terminal input internal mutex poisoned ({which})")]
    #[diagnostic(
        code(r3bl_term_input::mutex_poisoned),
        help(
            "A prior thread panicked while holding a lock. \
             Consider restarting the application."
        )
    )]
    MutexPoisoned {
        /// Which mutex was poisoned.
        which: &'static str,
    },
}

impl TermInputError {
    /// `true` for errors where simply reading again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::NoDataAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(TermInputError::Timeout, true)]
    #[test_case(TermInputError::NoDataAvailable, true)]
    #[test_case(TermInputError::Terminated, false)]
    #[test_case(TermInputError::NotInitialized, false)]
    #[test_case(TermInputError::StreamRead { kind: ErrorKind::UnexpectedEof }, false)]
    fn test_is_retryable(error: TermInputError, expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[test]
    fn test_display_mentions_cause() {
        let error = TermInputError::StreamRead {
            kind: ErrorKind::UnexpectedEof,
        };
        assert!(error.to_string().contains("unexpected end of file"));
        assert!(
            TermInputError::NotInitialized
                .to_string()
                .contains("not initialized")
        );
    }
}
