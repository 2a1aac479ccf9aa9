// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Event dispatching for the [`mio`] collector loop.

use super::{CollectorSink, MioCollectorWorker, SourceKindReady, consume_pending_signals,
            consume_stdin_input};
use crate::Continuation;
use mio::Token;

/// Routes a ready [`Token`] to its handler.
pub fn dispatch(
    token: Token,
    worker: &mut MioCollectorWorker,
    sink: &dyn CollectorSink,
) -> Continuation {
    match SourceKindReady::from_token(token) {
        SourceKindReady::Stdin => consume_stdin_input(worker, sink),
        SourceKindReady::Signals => consume_pending_signals(worker, sink),
        SourceKindReady::Unknown => handle_unknown(token),
    }
}

#[must_use]
pub fn handle_unknown(token: Token) -> Continuation {
    tracing::warn!(message = "term_input: unknown mio token", token = ?token);
    Continuation::Continue
}
