// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The lifecycle API. See [`TermInput`].

use crate::{BoundedByteChannel, CollectorSink, CollectorWorkerFactory,
            DEBUG_TERM_INPUT_SHOW_BYTES, ModeController, PopError, PushOutcome, ReadMode,
            RunState, RunStateCell, StopReason, TermInputConfig, TermInputError,
            TerminalBackend, spawn_collector_thread};
use std::{io::ErrorKind,
          sync::{Arc, Mutex, MutexGuard, PoisonError},
          thread::JoinHandle};

/// C style status returned by [`TermInput::get_char_status()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr)]
pub enum GetCharStatus {
    /// A byte was written to the caller's buffer.
    Ok,
    /// The pipeline is not running, or reading failed.
    NotReadyOrError,
    /// Non-blocking read with nothing buffered.
    NoDataAvailable,
}

/// State shared by the lifecycle API, the collector thread, and consumers for the
/// duration of one interactive session.
///
/// A fresh one is created by every successful [`TermInput::initialize()`], so a new
/// session always starts with an empty channel and a clean [`RunStateCell`].
#[derive(Debug)]
pub struct SessionShared<B: TerminalBackend> {
    pub run_state: RunStateCell,
    pub channel: BoundedByteChannel,
    mode_controller: Arc<ModeController<B>>,
}

impl<B: TerminalBackend> SessionShared<B> {
    fn new(config: &TermInputConfig, mode_controller: Arc<ModeController<B>>) -> Self {
        Self {
            run_state: RunStateCell::new(),
            channel: BoundedByteChannel::new(
                config.channel_capacity,
                config.close_policy,
                config.consumer_recheck_interval,
            ),
            mode_controller,
        }
    }

    /// Restores the terminal (once), then closes the channel so every blocked consumer
    /// wakes. Restoring first means no consumer observes the stop while the terminal
    /// is still raw. Idempotent.
    fn shut_down(&self) -> miette::Result<()> {
        let leave_result = self.mode_controller.leave();
        self.channel.close();
        leave_result.map(|_| ())
    }

    /// Shared tail of [`stop()`] and [`stop_with_stream_error()`] for the winner of the
    /// stop transition.
    ///
    /// [`stop()`]: CollectorSink::stop
    /// [`stop_with_stream_error()`]: CollectorSink::stop_with_stream_error
    fn shut_down_after_stop(&self) {
        tracing::debug!(
            message = "term_input: pipeline stopped",
            run_state = ?self.run_state.get()
        );
        if let Err(error) = self.shut_down() {
            tracing::warn!(message = "term_input: failed to restore terminal", error = ?error);
        }
    }

    /// The error a consumer sees once the channel reports closed.
    fn stopped_error(&self) -> TermInputError {
        match self.run_state.get() {
            RunState::Stopped(StopReason::StreamError) => TermInputError::StreamRead {
                kind: self
                    .run_state
                    .stream_error_kind()
                    .unwrap_or(ErrorKind::Other),
            },
            RunState::Stopped(StopReason::Terminated | StopReason::Signal)
            | RunState::Running
            | RunState::NotStarted => TermInputError::Terminated,
        }
    }
}

impl<B: TerminalBackend> CollectorSink for SessionShared<B> {
    fn is_running(&self) -> bool { self.run_state.is_running() }

    fn push_byte(&self, byte: u8) -> PushOutcome {
        let outcome = self.channel.push(byte);
        if DEBUG_TERM_INPUT_SHOW_BYTES {
            match outcome {
                PushOutcome::Stored => {
                    tracing::trace!(message = "term_input: byte stored", byte);
                }
                PushOutcome::DroppedFull | PushOutcome::DroppedClosed => {
                    tracing::trace!(message = "term_input: byte dropped", byte, ?outcome);
                }
            }
        }
        outcome
    }

    fn stop(&self, reason: StopReason) {
        if self.run_state.try_stop(reason) {
            self.shut_down_after_stop();
        }
    }

    fn stop_with_stream_error(&self, kind: ErrorKind) {
        if self.run_state.try_stop_with_stream_error(kind) {
            self.shut_down_after_stop();
        }
    }
}

#[derive(Debug)]
struct Session<B: TerminalBackend> {
    shared: Arc<SessionShared<B>>,
    maybe_collector: Option<JoinHandle<()>>,
}

impl<B: TerminalBackend> Session<B> {
    fn join_collector(&mut self) {
        if let Some(handle) = self.maybe_collector.take()
            && handle.join().is_err()
        {
            tracing::warn!(message = "term_input: collector thread panicked");
        }
    }

    /// Stops with [`StopReason::Terminated`] (unless already stopped), restores the
    /// terminal, wakes consumers, and joins the collector.
    fn terminate(&mut self) -> Result<(), TermInputError> {
        if self.shared.run_state.try_stop(StopReason::Terminated) {
            tracing::debug!(message = "term_input: terminate requested");
        }
        let shut_down_result = self.shared.shut_down();
        self.join_collector();
        shut_down_result.map_err(TermInputError::TerminalMode)
    }
}

/// Places the terminal in raw mode, collects every input byte on a dedicated thread,
/// and hands the bytes to consumers through a bounded channel.
///
/// ```text
/// stdin ──▶ collector thread ──push──▶ BoundedByteChannel ──pop──▶ get_char()
///                 │                                                   ▲
///   SIGINT/TERM ──┘ stop ──▶ restore terminal ──▶ close channel ──────┘ wake all
/// ```
///
/// # Lifecycle
///
/// - [`initialize()`]: idempotent. Starts a session: registers input sources and
///   signal handlers, enters interactive mode, starts with an empty channel, spawns the
///   collector.
/// - [`terminate()`]: idempotent. Stops the session, restores the terminal, wakes and
///   fails every blocked reader, joins the collector.
/// - A fatal stream error (including end-of-stream) or a termination signal stops the
///   session on its own; the terminal is restored from the collector thread.
/// - Once stopped, reads fail until a fresh [`initialize()`].
/// - [`Drop`] terminates, so the terminal is restored on every exit path that unwinds.
///
/// The terminal is restored exactly once per [`initialize()`], whichever of these paths
/// gets there first.
///
/// # Example
///
/// ```no_run
/// use r3bl_term_input::{ReadMode, TermInput, TermInputConfig};
/// use std::time::Duration;
///
/// let term_input = TermInput::new(TermInputConfig::default());
/// term_input.initialize()?;
/// while term_input.running() {
///     match term_input.get_char(ReadMode::blocking_with_timeout(Duration::from_secs(1))) {
///         Ok(b'q') => break,
///         Ok(byte) => println!("{byte:#04x}\r"),
///         Err(error) if error.is_retryable() => continue,
///         Err(error) => return Err(error.into()),
///     }
/// }
/// term_input.terminate()?;
/// # Ok::<(), miette::Report>(())
/// ```
///
/// [`initialize()`]: Self::initialize
/// [`terminate()`]: Self::terminate
#[derive(Debug)]
pub struct TermInput<B: TerminalBackend, F: CollectorWorkerFactory> {
    config: TermInputConfig,
    factory: F,
    mode_controller: Arc<ModeController<B>>,
    session: Mutex<Option<Session<B>>>,
}

#[cfg(unix)]
impl TermInput<crate::RustixTerminal, crate::MioCollectorFactory> {
    /// A pipeline on the process's real terminal and stdin.
    #[must_use]
    pub fn new(config: TermInputConfig) -> Self {
        Self::with_parts(
            config,
            crate::RustixTerminal,
            crate::MioCollectorFactory::default(),
        )
    }
}

impl<B: TerminalBackend, F: CollectorWorkerFactory> TermInput<B, F> {
    #[must_use]
    pub fn with_parts(config: TermInputConfig, backend: B, factory: F) -> Self {
        let mode_controller = Arc::new(ModeController::new(
            backend,
            config.raw_mode,
            config.terminal_features(),
        ));
        Self {
            config,
            factory,
            mode_controller,
            session: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TermInputConfig { &self.config }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<Session<B>>>, TermInputError> {
        self.session
            .lock()
            .map_err(|_| TermInputError::MutexPoisoned { which: "session" })
    }

    /// Starts a session. A no-op if one is already running.
    ///
    /// A session that stopped on its own (stream error, signal) is cleaned up first.
    /// Nothing is left behind on failure: sources are released, and the terminal is
    /// restored if it was already changed.
    ///
    /// # Errors
    ///
    /// - [`TermInputError::SourceRegistration`] if stdin or the signal handlers can't
    ///   be registered.
    /// - [`TermInputError::TerminalMode`] if raw mode can't be entered.
    /// - [`TermInputError::ThreadSpawn`] if the collector thread can't be started.
    /// - [`TermInputError::MutexPoisoned`].
    pub fn initialize(&self) -> Result<(), TermInputError> {
        let mut session_guard = self.lock_session()?;

        if session_guard
            .as_ref()
            .is_some_and(|session| session.shared.run_state.is_running())
        {
            return Ok(());
        }

        if let Some(mut stale_session) = session_guard.take() {
            stale_session.terminate()?;
        }

        let worker = self
            .factory
            .create_and_register_os_sources(&self.config)
            .map_err(TermInputError::SourceRegistration)?;

        self.mode_controller
            .enter()
            .map_err(TermInputError::TerminalMode)?;

        let shared = Arc::new(SessionShared::new(
            &self.config,
            Arc::clone(&self.mode_controller),
        ));
        shared.run_state.set_running();

        let handle = match spawn_collector_thread(worker, Arc::clone(&shared)) {
            Ok(handle) => handle,
            Err(error) => {
                shared.run_state.try_stop(StopReason::Terminated);
                if let Err(shut_down_error) = shared.shut_down() {
                    tracing::warn!(
                        message = "term_input: failed to restore terminal",
                        error = ?shut_down_error
                    );
                }
                return Err(TermInputError::ThreadSpawn(error));
            }
        };

        *session_guard = Some(Session {
            shared,
            maybe_collector: Some(handle),
        });

        tracing::debug!(
            message = "term_input: initialized",
            channel_capacity = self.config.channel_capacity,
            close_policy = self.config.close_policy.as_ref()
        );
        Ok(())
    }

    /// Stops the session. A no-op if none was ever started or it was already
    /// terminated.
    ///
    /// Returns after the terminal is restored and the collector thread has exited.
    ///
    /// # Errors
    ///
    /// - [`TermInputError::TerminalMode`] if the saved terminal configuration can't be
    ///   written back.
    /// - [`TermInputError::MutexPoisoned`].
    pub fn terminate(&self) -> Result<(), TermInputError> {
        match self.lock_session()?.as_mut() {
            Some(session) => session.terminate(),
            None => Ok(()),
        }
    }

    /// `true` iff a session is running.
    #[must_use]
    pub fn running(&self) -> bool {
        self.lock_session().is_ok_and(|session_guard| {
            session_guard
                .as_ref()
                .is_some_and(|session| session.shared.run_state.is_running())
        })
    }

    /// The current session's [`RunState`].
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.lock_session()
            .ok()
            .and_then(|session_guard| {
                session_guard
                    .as_ref()
                    .map(|session| session.shared.run_state.get())
            })
            .unwrap_or(RunState::NotStarted)
    }

    /// Reads one byte.
    ///
    /// The session lock is only held long enough to find the current session, so a
    /// blocked reader never prevents [`terminate()`] from running. Once the session
    /// stops, buffered bytes are still delivered or discarded according to
    /// [`ClosePolicy`].
    ///
    /// # Errors
    ///
    /// - [`TermInputError::NotInitialized`] before the first [`initialize()`].
    /// - [`TermInputError::NoDataAvailable`] for [`ReadMode::NonBlocking`] with nothing
    ///   buffered.
    /// - [`TermInputError::Timeout`] when a blocking read's timeout elapses.
    /// - [`TermInputError::StreamRead`] once the input stream failed.
    /// - [`TermInputError::Terminated`] once terminated or signalled.
    /// - [`TermInputError::MutexPoisoned`].
    ///
    /// [`ClosePolicy`]: crate::ClosePolicy
    /// [`initialize()`]: Self::initialize
    /// [`terminate()`]: Self::terminate
    pub fn get_char(&self, read_mode: ReadMode) -> Result<u8, TermInputError> {
        let shared = match self.lock_session()?.as_ref() {
            Some(session) => Arc::clone(&session.shared),
            None => return Err(TermInputError::NotInitialized),
        };

        shared.channel.pop(read_mode).map_err(|pop_error| match pop_error {
            PopError::Empty => TermInputError::NoDataAvailable,
            PopError::TimedOut => TermInputError::Timeout,
            PopError::Closed => shared.stopped_error(),
        })
    }

    /// [`get_char()`] with a C style out parameter. `blocking` waits with no timeout,
    /// until a byte arrives or the session stops.
    ///
    /// `buffer` is only written on [`GetCharStatus::Ok`].
    ///
    /// [`get_char()`]: Self::get_char
    pub fn get_char_status(&self, buffer: &mut u8, blocking: bool) -> GetCharStatus {
        let read_mode = if blocking {
            ReadMode::blocking_forever()
        } else {
            ReadMode::NonBlocking
        };
        match self.get_char(read_mode) {
            Ok(byte) => {
                *buffer = byte;
                GetCharStatus::Ok
            }
            Err(TermInputError::NoDataAvailable) => GetCharStatus::NoDataAvailable,
            Err(_) => GetCharStatus::NotReadyOrError,
        }
    }
}

impl<B: TerminalBackend, F: CollectorWorkerFactory> Drop for TermInput<B, F> {
    fn drop(&mut self) {
        let maybe_session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = maybe_session
            && let Err(error) = session.terminate()
        {
            tracing::warn!(message = "term_input: terminate on drop failed", error = ?error);
        }
    }
}
