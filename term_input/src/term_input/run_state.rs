// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Lock-free pipeline lifecycle flag shared by the collector thread, consumers, and the
//! lifecycle API.

use std::{io::ErrorKind,
          sync::{OnceLock,
                 atomic::{AtomicU8, Ordering}}};

/// Why the pipeline left [`RunState::Running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr)]
pub enum StopReason {
    /// [`terminate()`](crate::TermInput::terminate) was called.
    Terminated,
    /// Reading the input stream failed or hit end-of-file.
    StreamError,
    /// A termination signal was delivered.
    Signal,
}

/// ```text
/// NotStarted ──initialize()──▶ Running ──terminate() / stream error / signal──▶ Stopped
///     ▲                                                                            │
///     └───────────────────────────── initialize() (new session) ◀──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Stopped(StopReason),
}

impl RunState {
    #[must_use]
    pub fn is_running(self) -> bool { self == RunState::Running }

    const fn to_u8(self) -> u8 {
        match self {
            RunState::NotStarted => 0,
            RunState::Running => 1,
            RunState::Stopped(StopReason::Terminated) => 2,
            RunState::Stopped(StopReason::StreamError) => 3,
            RunState::Stopped(StopReason::Signal) => 4,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Stopped(StopReason::Terminated),
            3 => RunState::Stopped(StopReason::StreamError),
            4 => RunState::Stopped(StopReason::Signal),
            _ => RunState::NotStarted,
        }
    }
}

/// Atomic holder for [`RunState`], plus the [`ErrorKind`] of the stream failure when
/// the stop reason is [`StopReason::StreamError`].
///
/// Readable from any context, including a signal handler, without locking.
#[derive(Debug)]
pub struct RunStateCell {
    state: AtomicU8,
    stream_error_kind: OnceLock<ErrorKind>,
}

impl Default for RunStateCell {
    fn default() -> Self { Self::new() }
}

impl RunStateCell {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RunState::NotStarted.to_u8()),
            stream_error_kind: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn get(&self) -> RunState { RunState::from_u8(self.state.load(Ordering::SeqCst)) }

    #[must_use]
    pub fn is_running(&self) -> bool { self.get().is_running() }

    /// Unconditional store. Only the lifecycle API uses this, while it holds the session
    /// lock, to enter [`RunState::Running`].
    pub fn set_running(&self) { self.state.store(RunState::Running.to_u8(), Ordering::SeqCst); }

    /// Moves `Running -> Stopped(reason)`. Returns `true` for the one caller that wins
    /// the transition; later callers (whatever their reason) get `false` and the first
    /// reason is kept.
    pub fn try_stop(&self, reason: StopReason) -> bool {
        self.state
            .compare_exchange(
                RunState::Running.to_u8(),
                RunState::Stopped(reason).to_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Records the stream failure kind, then tries to stop with
    /// [`StopReason::StreamError`].
    ///
    /// The kind is stored before the state flips, so anyone who observes
    /// [`StopReason::StreamError`] also sees the kind. Only the collector reports
    /// stream errors, so the first recorded kind is the one that stops the session.
    pub fn try_stop_with_stream_error(&self, kind: ErrorKind) -> bool {
        if !self.is_running() {
            return false;
        }
        let _unused = self.stream_error_kind.set(kind);
        self.try_stop(StopReason::StreamError)
    }

    #[must_use]
    pub fn stream_error_kind(&self) -> Option<ErrorKind> { self.stream_error_kind.get().copied() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(RunState::NotStarted)]
    #[test_case(RunState::Running)]
    #[test_case(RunState::Stopped(StopReason::Terminated))]
    #[test_case(RunState::Stopped(StopReason::StreamError))]
    #[test_case(RunState::Stopped(StopReason::Signal))]
    fn test_u8_encoding_is_lossless(state: RunState) {
        assert_eq!(RunState::from_u8(state.to_u8()), state);
    }

    #[test]
    fn test_starts_not_started() {
        let cell = RunStateCell::new();
        assert_eq!(cell.get(), RunState::NotStarted);
        assert!(!cell.is_running());
    }

    #[test]
    fn test_stop_requires_running() {
        let cell = RunStateCell::new();
        assert!(!cell.try_stop(StopReason::Terminated));
        assert_eq!(cell.get(), RunState::NotStarted);
    }

    #[test]
    fn test_first_stop_reason_wins() {
        let cell = RunStateCell::new();
        cell.set_running();
        assert!(cell.try_stop(StopReason::Signal));
        assert!(!cell.try_stop(StopReason::Terminated));
        assert!(!cell.try_stop_with_stream_error(ErrorKind::UnexpectedEof));
        assert_eq!(cell.get(), RunState::Stopped(StopReason::Signal));
        assert_eq!(cell.stream_error_kind(), None);
    }

    #[test]
    fn test_stream_error_kind_is_recorded() {
        let cell = RunStateCell::new();
        cell.set_running();
        assert!(cell.try_stop_with_stream_error(ErrorKind::UnexpectedEof));
        assert_eq!(cell.get(), RunState::Stopped(StopReason::StreamError));
        assert_eq!(cell.stream_error_kind(), Some(ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_stream_error_kind_is_visible_as_soon_as_state_flips() {
        for _ in 0..200 {
            let cell = std::sync::Arc::new(RunStateCell::new());
            cell.set_running();
            let observer = {
                let cell = std::sync::Arc::clone(&cell);
                std::thread::spawn(move || {
                    while cell.get() != RunState::Stopped(StopReason::StreamError) {
                        std::hint::spin_loop();
                    }
                    cell.stream_error_kind()
                })
            };
            assert!(cell.try_stop_with_stream_error(ErrorKind::BrokenPipe));
            assert_eq!(observer.join().unwrap(), Some(ErrorKind::BrokenPipe));
        }
    }
}
