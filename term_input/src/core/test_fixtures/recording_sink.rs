// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CollectorSink, PushOutcome, StopReason};
use std::{io::ErrorKind,
          sync::{Mutex, PoisonError,
                 atomic::{AtomicBool, Ordering}}};

/// [`CollectorSink`] that stores every byte and every stop request, so a
/// [`CollectorWorker`] can be driven directly, without a channel or a terminal.
///
/// Every byte is [`PushOutcome::Stored`]; there is no capacity.
///
/// [`CollectorWorker`]: crate::CollectorWorker
#[derive(Debug, Default)]
pub struct RecordingSink {
    stopped: AtomicBool,
    bytes: Mutex<Vec<u8>>,
    stops: Mutex<Vec<(StopReason, Option<ErrorKind>)>>,
}

impl RecordingSink {
    /// Makes [`is_running()`](CollectorSink::is_running) report `false` without
    /// recording a stop.
    pub fn mark_stopped(&self) { self.stopped.store(true, Ordering::SeqCst); }

    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every stop request in arrival order. The [`ErrorKind`] is only present for
    /// [`stop_with_stream_error()`](CollectorSink::stop_with_stream_error).
    #[must_use]
    pub fn stops(&self) -> Vec<(StopReason, Option<ErrorKind>)> {
        self.stops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_stop(&self, reason: StopReason, maybe_kind: Option<ErrorKind>) {
        self.stopped.store(true, Ordering::SeqCst);
        self.stops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((reason, maybe_kind));
    }
}

impl CollectorSink for RecordingSink {
    fn is_running(&self) -> bool { !self.stopped.load(Ordering::SeqCst) }

    fn push_byte(&self, byte: u8) -> PushOutcome {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(byte);
        PushOutcome::Stored
    }

    fn stop(&self, reason: StopReason) { self.record_stop(reason, None); }

    fn stop_with_stream_error(&self, kind: ErrorKind) {
        self.record_stop(StopReason::StreamError, Some(kind));
    }
}
