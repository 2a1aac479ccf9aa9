// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR epoll kqueue

//! [`mio`] based [`CollectorWorker`] reading the process's stdin, or an injected fd.

use super::{CollectorSink, CollectorWorker, CollectorWorkerFactory,
            DefaultActionSuspension, SourceKindReady, SourceRegistry, dispatch,
            handler_stdin::STDIN_READ_BUFFER_SIZE};
use crate::{Continuation, TermInputConfig};
use miette::Diagnostic;
use mio::{Events, Interest, Poll, Token, unix::SourceFd};
use signal_hook_mio::v1_0::Signals;
use std::{io::ErrorKind,
          os::fd::{AsFd as _, AsRawFd as _, OwnedFd},
          time::Duration};

/// Capacity for the [`mio::Events`] buffer.
const EVENTS_CAPACITY: usize = 8;

/// Waits on stdin and termination signals with a bounded timeout, then dispatches.
///
/// | Resource                      | Purpose                                     |
/// | :---------------------------- | :------------------------------------------ |
/// | [`poll_handle`]               | I/O multiplexing (epoll / kqueue)           |
/// | [`sources`]                   | stdin and termination signal handles        |
/// | [`stdin_read_buffer`]         | Raw bytes read from stdin                   |
/// | [`default_action_suspension`] | Keeps signals from killing the process      |
///
/// [`default_action_suspension`]: Self::default_action_suspension
/// [`poll_handle`]: Self::poll_handle
/// [`sources`]: Self::sources
/// [`stdin_read_buffer`]: Self::stdin_read_buffer
#[allow(missing_debug_implementations)]
pub struct MioCollectorWorker {
    pub poll_handle: Poll,
    pub ready_events_buffer: Events,
    pub sources: SourceRegistry,
    pub stdin_read_buffer: [u8; STDIN_READ_BUFFER_SIZE],
    /// Upper bound on one wait, so the loop notices a stop requested elsewhere.
    pub poll_interval: Duration,
    pub termination_signals: Vec<i32>,
    /// Declared after [`sources`] so the [`Signals`] handler is gone before the
    /// default action is re-armed.
    ///
    /// [`sources`]: Self::sources
    pub default_action_suspension: DefaultActionSuspension,
}

impl CollectorWorker for MioCollectorWorker {
    fn block_until_ready_then_dispatch(&mut self, sink: &dyn CollectorSink) -> Continuation {
        // Breaks borrow so dispatch can use `&mut self`.
        fn collect_ready_tokens(events: &Events) -> Vec<Token> {
            events.iter().map(mio::event::Event::token).collect()
        }

        if let Err(err) = self
            .poll_handle
            .poll(&mut self.ready_events_buffer, Some(self.poll_interval))
        {
            if err.kind() == ErrorKind::Interrupted {
                return Continuation::Continue;
            }
            tracing::warn!(message = "term_input: mio poll failed", error = ?err);
            sink.stop_with_stream_error(err.kind());
            return Continuation::Stop;
        }

        for token in collect_ready_tokens(&self.ready_events_buffer) {
            if dispatch(token, self, sink) == Continuation::Stop {
                return Continuation::Stop;
            }
        }

        Continuation::Continue
    }
}

// ╭──────────────────────────────────────────────────────────╮
// │ Diagnostic error types for worker creation failures      │
// ╰──────────────────────────────────────────────────────────╯

/// Failed to create [`mio::Poll`] (epoll/kqueue creation failed).
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Failed to create mio::Poll")]
#[diagnostic(
    code(r3bl_term_input::mio::poll_creation),
    help("This usually means the system ran out of file descriptors")
)]
pub struct PollCreationError(#[source] pub std::io::Error);

/// Failed to register stdin with mio.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Failed to register stdin with mio")]
#[diagnostic(
    code(r3bl_term_input::mio::stdin_registration),
    help("Ensure stdin is a valid, pollable file descriptor (a TTY or a pipe)")
)]
pub struct StdinRegistrationError(#[source] pub std::io::Error);

/// Failed to install the termination signal handlers.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Failed to install termination signal handlers {signals:?}")]
#[diagnostic(
    code(r3bl_term_input::mio::signal_creation),
    help("Forbidden signals (SIGKILL, SIGSTOP, SIGILL, SIGFPE, SIGSEGV) can't be handled")
)]
pub struct SignalCreationError {
    pub signals: Vec<i32>,
    #[source]
    pub source: std::io::Error,
}

/// Failed to register signals with mio.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Failed to register signals with mio")]
#[diagnostic(code(r3bl_term_input::mio::signal_registration))]
pub struct SignalRegistrationError(#[source] pub std::io::Error);

// ╭──────────────────────────────────────────────────────────╮
// │ Factory                                                  │
// ╰──────────────────────────────────────────────────────────╯

/// Creates a [`MioCollectorWorker`] bound to the process's stdin, or to the fd handed
/// to [`with_input_fd()`].
///
/// Every worker reads through its own duplicate of the descriptor, so one factory
/// serves any number of sessions.
///
/// [`with_input_fd()`]: Self::with_input_fd
#[derive(Debug, Default)]
pub struct MioCollectorFactory {
    maybe_input_fd: Option<OwnedFd>,
}

impl MioCollectorFactory {
    /// Reads from `input_fd` (a pipe, a socket, a PTY) instead of the process's stdin.
    #[must_use]
    pub fn with_input_fd(input_fd: impl Into<OwnedFd>) -> Self {
        Self {
            maybe_input_fd: Some(input_fd.into()),
        }
    }

    fn duplicate_input_fd(&self) -> std::io::Result<OwnedFd> {
        match &self.maybe_input_fd {
            Some(input_fd) => input_fd.try_clone(),
            None => std::io::stdin().as_fd().try_clone_to_owned(),
        }
    }
}

impl CollectorWorkerFactory for MioCollectorFactory {
    type Worker = MioCollectorWorker;

    /// 1. Creates a new [`mio::Poll`].
    /// 2. Duplicates the input fd and registers it.
    /// 3. Suspends the default action of the termination signals, see
    ///    [`DefaultActionSuspension`].
    /// 4. Installs handlers for the termination signals via [`signal_hook_mio`] and
    ///    registers them.
    fn create_and_register_os_sources(
        &self,
        config: &TermInputConfig,
    ) -> miette::Result<Self::Worker> {
        let poll_handle = Poll::new().map_err(PollCreationError)?;
        let mio_registry = poll_handle.registry();

        let stdin = self.duplicate_input_fd().map_err(StdinRegistrationError)?;
        mio_registry
            .register(
                &mut SourceFd(&stdin.as_raw_fd()),
                SourceKindReady::STDIN_TOKEN,
                Interest::READABLE,
            )
            .map_err(StdinRegistrationError)?;

        let signal_creation_error = |source| SignalCreationError {
            signals: config.termination_signals.clone(),
            source,
        };
        let default_action_suspension =
            DefaultActionSuspension::acquire(&config.termination_signals)
                .map_err(signal_creation_error)?;
        let mut signals =
            Signals::new(&config.termination_signals).map_err(signal_creation_error)?;
        mio_registry
            .register(&mut signals, SourceKindReady::SIGNALS_TOKEN, Interest::READABLE)
            .map_err(SignalRegistrationError)?;

        Ok(MioCollectorWorker {
            poll_handle,
            ready_events_buffer: Events::with_capacity(EVENTS_CAPACITY),
            sources: SourceRegistry { stdin, signals },
            stdin_read_buffer: [0u8; STDIN_READ_BUFFER_SIZE],
            poll_interval: config.collector_poll_interval,
            termination_signals: config.termination_signals.clone(),
            default_action_suspension,
        })
    }
}
