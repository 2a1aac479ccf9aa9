// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR

//! Event handler for stdin becoming readable.

use super::{CollectorSink, MioCollectorWorker};
use crate::{Continuation, DEBUG_TERM_INPUT_SHOW_BYTES};
use rustix::event::{PollFd, PollFlags, Timespec};
use std::{io::{self, ErrorKind},
          os::fd::AsFd};

/// Read buffer size for stdin reads (`1_024` bytes).
///
/// When `read_count == STDIN_READ_BUFFER_SIZE`, more data may still be waiting in the
/// kernel buffer.
pub const STDIN_READ_BUFFER_SIZE: usize = 1_024;

/// Handles stdin (the worker's input fd) becoming readable.
///
/// Reads whatever is available and pushes every byte, in order, to `sink`. [`mio`]
/// readiness is edge triggered, so after a full buffer this keeps reading for as long
/// as [`stdin_has_pending_bytes()`] says more is waiting; otherwise those bytes would
/// sit unread until the next keystroke.
///
/// # Returns
///
/// - [`Continuation::Continue`]: bytes pushed, or a retryable error ([`EINTR`],
///   [`WouldBlock`]).
/// - [`Continuation::Stop`]: end-of-stream or a fatal read error. The pipeline has
///   been stopped with [`StopReason::StreamError`].
///
/// [`EINTR`]: ErrorKind::Interrupted
/// [`StopReason::StreamError`]: crate::StopReason::StreamError
/// [`WouldBlock`]: ErrorKind::WouldBlock
pub fn consume_stdin_input(
    worker: &mut MioCollectorWorker,
    sink: &dyn CollectorSink,
) -> Continuation {
    loop {
        // Read the fd directly. A buffered reader would hide bytes from the readiness
        // check below.
        let read_result =
            rustix::io::read(&worker.sources.stdin, &mut worker.stdin_read_buffer[..])
                .map_err(io::Error::from);
        match read_result {
            Ok(0) => {
                tracing::warn!(message = "term_input: stdin reached end-of-stream");
                sink.stop_with_stream_error(ErrorKind::UnexpectedEof);
                return Continuation::Stop;
            }

            Ok(n) => {
                if DEBUG_TERM_INPUT_SHOW_BYTES {
                    tracing::trace!(message = "term_input: read bytes", bytes_read = n);
                }
                for byte in &worker.stdin_read_buffer[..n] {
                    sink.push_byte(*byte);
                }
                if n < STDIN_READ_BUFFER_SIZE {
                    return Continuation::Continue;
                }
            }

            Err(ref e) if e.kind() == ErrorKind::Interrupted => {
                // EINTR: nothing was read, retry.
            }

            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                return Continuation::Continue;
            }

            Err(e) => {
                tracing::warn!(message = "term_input: stdin read error", error = ?e);
                sink.stop_with_stream_error(e.kind());
                return Continuation::Stop;
            }
        }

        if !sink.is_running() {
            return Continuation::Stop;
        }
        if !stdin_has_pending_bytes(&worker.sources.stdin) {
            return Continuation::Continue;
        }
    }
}

/// Zero timeout readiness check on the input fd. A hung up fd counts as pending, so
/// the next read reports end-of-stream.
#[must_use]
pub fn stdin_has_pending_bytes(input_fd: &impl AsFd) -> bool {
    let mut poll_fds = [PollFd::new(input_fd, PollFlags::IN)];
    let zero = Timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    matches!(rustix::event::poll(&mut poll_fds, Some(&zero)), Ok(ready) if ready > 0)
}
