// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Dependency injection seams for the collector thread.

use crate::{Continuation, PushOutcome, StopReason, TermInputConfig};
use std::io::ErrorKind;

/// Everything a [`CollectorWorker`] is allowed to do to the pipeline.
///
/// Implemented by the pipeline's shared state. Every method is callable from the
/// collector thread while consumers and the lifecycle API run concurrently.
pub trait CollectorSink: Send + Sync {
    /// `false` once the pipeline has left [`RunState::Running`].
    ///
    /// [`RunState::Running`]: crate::RunState::Running
    fn is_running(&self) -> bool;

    /// Hands one byte to the channel. Never blocks.
    fn push_byte(&self, byte: u8) -> PushOutcome;

    /// Stops the pipeline: restores the terminal, closes the channel, and wakes all
    /// consumers. A no-op if the pipeline already stopped.
    fn stop(&self, reason: StopReason);

    /// [`stop()`](Self::stop) with [`StopReason::StreamError`], remembering `kind` so
    /// consumers can report it.
    fn stop_with_stream_error(&self, kind: ErrorKind);
}

/// One iteration of the collector loop, run on the dedicated collector thread.
///
/// Implementations must return within a bounded time (the configured
/// [`collector_poll_interval`]) even when no input arrives, so the loop can notice that
/// the pipeline stopped.
///
/// [`collector_poll_interval`]: crate::TermInputConfig::collector_poll_interval
pub trait CollectorWorker: Send + 'static {
    /// Waits for input (bounded), then pushes every byte read, in order, to `sink`.
    ///
    /// # Returns
    ///
    /// - [`Continuation::Continue`]: processed input, timed out, or hit a retryable
    ///   error.
    /// - [`Continuation::Stop`]: the worker called [`CollectorSink::stop()`] (stream
    ///   error, end-of-stream, termination signal) and the thread should exit.
    fn block_until_ready_then_dispatch(&mut self, sink: &dyn CollectorSink) -> Continuation;
}

/// Creates a fresh [`CollectorWorker`] for each interactive session.
///
/// Called by [`TermInput::initialize()`] before the terminal is touched, so a failure to
/// acquire OS resources leaves the terminal as it was.
///
/// [`TermInput::initialize()`]: crate::TermInput::initialize
pub trait CollectorWorkerFactory: Send + Sync + 'static {
    type Worker: CollectorWorker;

    /// Acquires and registers the OS resources (input stream, signal handlers) the
    /// worker needs.
    ///
    /// # Errors
    ///
    /// If any OS resource can't be created or registered.
    fn create_and_register_os_sources(
        &self,
        config: &TermInputConfig,
    ) -> miette::Result<Self::Worker>;
}
