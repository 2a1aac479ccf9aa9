// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CollectorSink, CollectorWorker, CollectorWorkerFactory, Continuation,
            StopReason, TermInputConfig};
use miette::miette;
use std::{io::ErrorKind,
          sync::{Arc, Mutex, PoisonError,
                 atomic::{AtomicBool, AtomicUsize, Ordering},
                 mpsc::{self, Receiver, RecvTimeoutError, Sender}},
          thread,
          time::Duration};

/// One thing the input stream "does", as seen by [`ScriptedInputWorker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedInput {
    Bytes(Vec<u8>),
    ReadError(ErrorKind),
    /// The stream returned zero bytes.
    EndOfStream,
    /// A termination signal was delivered.
    Signal,
}

/// [`CollectorWorker`] fed through an [`mpsc`] channel instead of stdin.
#[derive(Debug)]
pub struct ScriptedInputWorker {
    receiver: Receiver<ScriptedInput>,
    poll_interval: Duration,
}

impl CollectorWorker for ScriptedInputWorker {
    fn block_until_ready_then_dispatch(&mut self, sink: &dyn CollectorSink) -> Continuation {
        match self.receiver.recv_timeout(self.poll_interval) {
            Ok(ScriptedInput::Bytes(bytes)) => {
                for byte in bytes {
                    sink.push_byte(byte);
                }
                Continuation::Continue
            }
            Ok(ScriptedInput::ReadError(kind)) => {
                sink.stop_with_stream_error(kind);
                Continuation::Stop
            }
            Ok(ScriptedInput::EndOfStream) => {
                sink.stop_with_stream_error(ErrorKind::UnexpectedEof);
                Continuation::Stop
            }
            Ok(ScriptedInput::Signal) => {
                sink.stop(StopReason::Signal);
                Continuation::Stop
            }
            Err(RecvTimeoutError::Timeout) => Continuation::Continue,
            Err(RecvTimeoutError::Disconnected) => {
                // Nothing more will ever arrive; keep the bounded wait.
                thread::sleep(self.poll_interval);
                Continuation::Continue
            }
        }
    }
}

/// [`CollectorWorkerFactory`] for [`ScriptedInputWorker`].
///
/// Each session gets a fresh worker; [`send()`] always targets the most recently
/// created one. Clones share state, so a test keeps one clone to drive input while the
/// pipeline owns another.
///
/// [`send()`]: Self::send
#[derive(Debug, Clone, Default)]
pub struct ScriptedInputFactory {
    current_sender: Arc<Mutex<Option<Sender<ScriptedInput>>>>,
    create_count: Arc<AtomicUsize>,
    fail_create: Arc<AtomicBool>,
}

impl ScriptedInputFactory {
    /// Every subsequent
    /// [`create_and_register_os_sources()`](CollectorWorkerFactory::create_and_register_os_sources)
    /// fails.
    #[must_use]
    pub fn with_failing_create(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    /// Returns `false` if no worker exists yet or it has gone away.
    pub fn send(&self, input: ScriptedInput) -> bool {
        self.current_sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| sender.send(input).is_ok())
    }

    pub fn send_bytes(&self, bytes: &[u8]) -> bool {
        self.send(ScriptedInput::Bytes(bytes.to_vec()))
    }

    #[must_use]
    pub fn create_count(&self) -> usize { self.create_count.load(Ordering::SeqCst) }
}

impl CollectorWorkerFactory for ScriptedInputFactory {
    type Worker = ScriptedInputWorker;

    fn create_and_register_os_sources(
        &self,
        config: &TermInputConfig,
    ) -> miette::Result<Self::Worker> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(miette!("scripted input: source registration failed"));
        }
        let (sender, receiver) = mpsc::channel();
        *self
            .current_sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(sender);
        self.create_count.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedInputWorker {
            receiver,
            poll_interval: config.collector_poll_interval,
        })
    }
}
