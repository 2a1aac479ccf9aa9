// Copyright (c) 2023-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Control flow signal for loops and threads.
///
/// Returned by [`CollectorWorker::block_until_ready_then_dispatch()`] and by the
/// per-source handlers it dispatches to, so the collector thread knows whether to keep
/// polling or exit.
///
/// [`CollectorWorker::block_until_ready_then_dispatch()`]: crate::CollectorWorker::block_until_ready_then_dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Continue to the next iteration.
    #[default]
    Continue,

    /// Stop processing and exit the loop/thread.
    Stop,
}

impl Continuation {
    #[must_use]
    pub fn is_stop(self) -> bool { self == Continuation::Stop }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_continue() {
        assert_eq!(Continuation::default(), Continuation::Continue);
        assert!(!Continuation::default().is_stop());
        assert!(Continuation::Stop.is_stop());
    }
}
