// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR epoll kqueue

//! The Input Collector: a dedicated thread that is the sole producer for the
//! [`BoundedByteChannel`].
//!
//! # Architecture
//!
//! The thread loop ([`run_collector_loop()`]) is generic. All I/O lives behind the
//! [`CollectorWorker`] trait, and everything the worker may do to the pipeline lives
//! behind the [`CollectorSink`] trait:
//!
//! ```text
//! ┌──────────────── collector thread ─────────────────┐
//! │ while sink.is_running()                           │
//! │   worker.block_until_ready_then_dispatch(sink) ───┼──▶ sink.push_byte(b)
//! │        │                                          │    sink.stop(Signal)
//! │        └── bounded wait (collector_poll_interval) │    sink.stop_with_stream_error(kind)
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! - [`MioCollectorWorker`] waits on [`mio::Poll`] (epoll on Linux, kqueue on macOS) for
//!   stdin (or any injected fd) and for termination signals delivered through
//!   [`signal_hook_mio`].
//! - [`ScriptedInputWorker`] replays bytes, errors, and signals fed by a test.
//!
//! # Signals
//!
//! The OS-level signal handler installed by [`signal_hook`] only writes to an internal
//! pipe, which is async-signal-safe. The pipe becomes readable, [`mio::Poll`] wakes the
//! collector thread, and [`consume_pending_signals()`] stops the pipeline from regular
//! thread context. Restoring the terminal, closing the channel, and waking consumers all
//! happen there, never inside the handler.
//!
//! Outside a running session the same signals get their default action back, see
//! [`DefaultActionSuspension`].
//!
//! # EINTR handling
//!
//! [`Poll::poll()`] and [`read()`] can fail with [`ErrorKind::Interrupted`] when a signal
//! arrives mid syscall. Both are retried on the next loop iteration.
//!
//! [`BoundedByteChannel`]: crate::BoundedByteChannel
//! [`DefaultActionSuspension`]: crate::DefaultActionSuspension
//! [`ErrorKind::Interrupted`]: std::io::ErrorKind::Interrupted
//! [`MioCollectorWorker`]: crate::MioCollectorWorker
//! [`Poll::poll()`]: mio::Poll::poll
//! [`ScriptedInputWorker`]: crate::ScriptedInputWorker
//! [`consume_pending_signals()`]: crate::consume_pending_signals
//! [`read()`]: rustix::io::read

// Attach sources.
pub mod collector_thread;
pub mod collector_traits;
#[cfg(unix)]
pub mod dispatcher;
#[cfg(unix)]
pub mod handler_signals;
#[cfg(unix)]
pub mod handler_stdin;
#[cfg(unix)]
pub mod mio_collector_worker;
#[cfg(unix)]
pub mod signal_default_action;
#[cfg(unix)]
pub mod sources;

// Re-export.
pub use collector_thread::*;
pub use collector_traits::*;
#[cfg(unix)]
pub use dispatcher::*;
#[cfg(unix)]
pub use handler_signals::*;
#[cfg(unix)]
pub use handler_stdin::*;
#[cfg(unix)]
pub use mio_collector_worker::*;
#[cfg(unix)]
pub use signal_default_action::*;
#[cfg(unix)]
pub use sources::*;
