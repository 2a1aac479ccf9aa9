// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{RawModeFlavor, TerminalBackend};
use miette::miette;
use std::sync::{Arc, Mutex, PoisonError,
                atomic::{AtomicBool, AtomicUsize, Ordering}};

/// Snapshot handed out by [`MockTerminal::enter_raw_mode()`]. Carries the 1-based entry
/// number so tests can check that the matching snapshot was restored.
///
/// [`MockTerminal::enter_raw_mode()`]: TerminalBackend::enter_raw_mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSavedConfig {
    pub entry_number: usize,
}

/// [`TerminalBackend`] that counts calls and captures written control bytes.
///
/// Cloning shares the same counters, so a test can keep one clone while the pipeline
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockTerminal {
    inner: Arc<MockTerminalInner>,
}

#[derive(Debug, Default)]
struct MockTerminalInner {
    enter_count: AtomicUsize,
    restore_count: AtomicUsize,
    restored: Mutex<Vec<MockSavedConfig>>,
    written: Mutex<Vec<u8>>,
    last_flavor: Mutex<Option<RawModeFlavor>>,
    fail_enter: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockTerminal {
    /// Every subsequent [`enter_raw_mode()`](TerminalBackend::enter_raw_mode) fails.
    #[must_use]
    pub fn with_failing_enter(self) -> Self {
        self.inner.fail_enter.store(true, Ordering::SeqCst);
        self
    }

    /// Every subsequent
    /// [`write_control_sequence()`](TerminalBackend::write_control_sequence) fails.
    #[must_use]
    pub fn with_failing_writes(self) -> Self {
        self.inner.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn enter_count(&self) -> usize { self.inner.enter_count.load(Ordering::SeqCst) }

    #[must_use]
    pub fn restore_count(&self) -> usize { self.inner.restore_count.load(Ordering::SeqCst) }

    /// Snapshots passed to `restore()`, in call order.
    #[must_use]
    pub fn restored_snapshots(&self) -> Vec<MockSavedConfig> {
        self.inner
            .restored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn written_bytes(&self) -> Vec<u8> {
        self.inner
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last_flavor(&self) -> Option<RawModeFlavor> {
        *self
            .inner
            .last_flavor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` while an entry has not been matched by a restore.
    #[must_use]
    pub fn is_raw(&self) -> bool { self.enter_count() > self.restore_count() }
}

impl TerminalBackend for MockTerminal {
    type Saved = MockSavedConfig;

    fn enter_raw_mode(&self, flavor: RawModeFlavor) -> miette::Result<Self::Saved> {
        if self.inner.fail_enter.load(Ordering::SeqCst) {
            return Err(miette!("mock terminal: enter_raw_mode failed"));
        }
        *self
            .inner
            .last_flavor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(flavor);
        let entry_number = self.inner.enter_count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockSavedConfig { entry_number })
    }

    fn restore(&self, saved: &Self::Saved) -> miette::Result<()> {
        self.inner
            .restored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*saved);
        self.inner.restore_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_control_sequence(&self, bytes: &[u8]) -> miette::Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(miette!("mock terminal: write failed"));
        }
        self.inner
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }
}
