// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Event handler for termination signals.

use super::{CollectorSink, MioCollectorWorker};
use crate::{Continuation, StopReason};

/// Drains every pending signal. If any of them is one of the configured termination
/// signals, stops the pipeline with [`StopReason::Signal`].
///
/// Runs on the collector thread, not in signal context, so stopping (which restores the
/// terminal and takes the channel lock) is safe here.
///
/// # Returns
///
/// - [`Continuation::Continue`]: only unrelated signals were pending.
/// - [`Continuation::Stop`]: a termination signal arrived.
pub fn consume_pending_signals(
    worker: &mut MioCollectorWorker,
    sink: &dyn CollectorSink,
) -> Continuation {
    let termination_signals = &worker.termination_signals;
    let maybe_received = worker
        .sources
        .signals
        .pending()
        .filter(|signal| termination_signals.contains(signal))
        .last();

    match maybe_received {
        Some(signal) => {
            tracing::debug!(message = "term_input: termination signal received", signal);
            sink.stop(StopReason::Signal);
            Continuation::Stop
        }
        None => Continuation::Continue,
    }
}
