// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Spawning and running the dedicated collector thread.

use super::{CollectorSink, CollectorWorker};
use crate::Continuation;
use std::{io::{self, ErrorKind},
          sync::Arc,
          thread::{self, JoinHandle}};

/// Name given to the collector thread, visible in debuggers and panic messages.
pub const COLLECTOR_THREAD_NAME: &str = "term-input-collector";

/// Spawns the collector thread, which runs [`run_collector_loop()`] until the pipeline
/// stops.
///
/// # Errors
///
/// If the OS refuses to create a thread.
pub fn spawn_collector_thread<W, S>(worker: W, sink: Arc<S>) -> io::Result<JoinHandle<()>>
where
    W: CollectorWorker,
    S: CollectorSink + 'static,
{
    thread::Builder::new()
        .name(COLLECTOR_THREAD_NAME.into())
        .spawn(move || run_collector_loop(worker, &*sink))
}

/// The collector loop. Exits as soon as the pipeline stops or the worker returns
/// [`Continuation::Stop`].
pub fn run_collector_loop(mut worker: impl CollectorWorker, sink: &dyn CollectorSink) {
    let _guard = CollectorExitGuard { sink };
    while sink.is_running()
        && worker.block_until_ready_then_dispatch(sink) == Continuation::Continue
    {}
    // _guard dropped here (or during unwinding).
}

/// Makes sure the pipeline never reports [`RunState::Running`] without a live collector.
///
/// If the loop exits (or the worker panics) while the pipeline still thinks it is
/// running, the pipeline is stopped with a stream error so consumers are woken instead
/// of waiting for bytes that will never come.
///
/// [`RunState::Running`]: crate::RunState::Running
struct CollectorExitGuard<'a> {
    sink: &'a dyn CollectorSink,
}

impl Drop for CollectorExitGuard<'_> {
    fn drop(&mut self) {
        if self.sink.is_running() {
            tracing::warn!(
                message = "term_input: collector exited while pipeline was running",
                panicking = thread::panicking()
            );
            self.sink.stop_with_stream_error(ErrorKind::Other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordingSink, StopReason};
    use pretty_assertions::assert_eq;

    /// Pushes its script one chunk per iteration, then returns whatever `on_end` says.
    struct ChunkWorker {
        chunks: Vec<&'static [u8]>,
        on_end: fn(&dyn CollectorSink) -> Continuation,
    }

    impl CollectorWorker for ChunkWorker {
        fn block_until_ready_then_dispatch(
            &mut self,
            sink: &dyn CollectorSink,
        ) -> Continuation {
            if self.chunks.is_empty() {
                return (self.on_end)(sink);
            }
            for byte in self.chunks.remove(0) {
                sink.push_byte(*byte);
            }
            Continuation::Continue
        }
    }

    #[test]
    fn test_loop_pushes_in_order_until_worker_stops() {
        let sink = RecordingSink::default();
        let worker = ChunkWorker {
            chunks: vec![b"hi", b"q"],
            on_end: |sink| {
                sink.stop(StopReason::Signal);
                Continuation::Stop
            },
        };
        run_collector_loop(worker, &sink);
        assert_eq!(sink.bytes(), b"hiq".to_vec());
        assert_eq!(sink.stops(), vec![(StopReason::Signal, None)]);
    }

    #[test]
    fn test_loop_does_not_run_when_already_stopped() {
        let sink = RecordingSink::default();
        sink.mark_stopped();
        let worker = ChunkWorker {
            chunks: vec![b"x"],
            on_end: |_| Continuation::Stop,
        };
        run_collector_loop(worker, &sink);
        assert!(sink.bytes().is_empty());
        assert!(sink.stops().is_empty());
    }

    #[test]
    fn test_exit_guard_stops_pipeline_when_worker_quits_silently() {
        let sink = RecordingSink::default();
        let worker = ChunkWorker {
            chunks: vec![],
            on_end: |_| Continuation::Stop,
        };
        run_collector_loop(worker, &sink);
        assert_eq!(
            sink.stops(),
            vec![(StopReason::StreamError, Some(ErrorKind::Other))]
        );
    }

    #[test]
    fn test_exit_guard_stops_pipeline_when_worker_panics() {
        struct PanickingWorker;
        impl CollectorWorker for PanickingWorker {
            fn block_until_ready_then_dispatch(
                &mut self,
                _sink: &dyn CollectorSink,
            ) -> Continuation {
                panic!("worker blew up");
            }
        }

        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_collector_thread(PanickingWorker, Arc::clone(&sink)).unwrap();
        assert!(handle.join().is_err());
        assert!(!sink.is_running());
        assert_eq!(
            sink.stops(),
            vec![(StopReason::StreamError, Some(ErrorKind::Other))]
        );
    }
}
