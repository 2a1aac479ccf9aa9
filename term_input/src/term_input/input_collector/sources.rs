// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Source registry and token mapping for the [`mio`] collector loop.

use mio::Token;
use signal_hook_mio::v1_0::Signals;
use std::os::fd::OwnedFd;

/// Every event source registered with the collector's [`mio::Poll`].
///
/// The two sources are consumed differently, so they are kept as typed fields rather
/// than in a map:
/// - **Input fd**: [`read()`] bytes, see [`consume_stdin_input()`].
/// - **[`Signals`]**: drain [`pending()`], see [`consume_pending_signals()`].
///
/// [`Signals`]: signal_hook_mio::v1_0::Signals
/// [`consume_pending_signals()`]: super::consume_pending_signals
/// [`consume_stdin_input()`]: super::consume_stdin_input
/// [`pending()`]: signal_hook_mio::v1_0::Signals::pending
/// [`read()`]: rustix::io::read
#[allow(missing_debug_implementations)]
pub struct SourceRegistry {
    /// A duplicate of the process's stdin, or of the fd handed to
    /// [`MioCollectorFactory::with_input_fd()`]. Closed when the worker is dropped.
    ///
    /// Token: [`SourceKindReady::Stdin`].
    ///
    /// [`MioCollectorFactory::with_input_fd()`]: super::MioCollectorFactory::with_input_fd
    pub stdin: OwnedFd,

    /// Termination signals. [`signal_hook_mio`] backs this with an internal pipe that
    /// becomes readable when a registered signal arrives.
    ///
    /// Token: [`SourceKindReady::Signals`].
    pub signals: Signals,
}

/// Which registered source became ready. The single place where [`Token`] values are
/// assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKindReady {
    Stdin,
    Signals,
    /// A token nobody registered. Should not happen.
    Unknown,
}

impl SourceKindReady {
    pub const STDIN_TOKEN: Token = Token(0);
    pub const SIGNALS_TOKEN: Token = Token(1);

    #[must_use]
    pub const fn from_token(token: Token) -> Self {
        match token {
            Self::STDIN_TOKEN => Self::Stdin,
            Self::SIGNALS_TOKEN => Self::Signals,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(Token(0), SourceKindReady::Stdin)]
    #[test_case(Token(1), SourceKindReady::Signals)]
    #[test_case(Token(42), SourceKindReady::Unknown)]
    fn test_from_token(token: Token, expected: SourceKindReady) {
        assert_eq!(SourceKindReady::from_token(token), expected);
    }
}
