// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Enters and leaves interactive terminal mode. See [`ModeController`].

use crate::{RawModeFlavor, TerminalFeatures};
use std::sync::{Mutex, PoisonError,
                atomic::{AtomicBool, Ordering}};

/// The OS-facing side effects the [`ModeController`] sequences.
///
/// The real implementation is [`RustixTerminal`]. Tests substitute
/// [`MockTerminal`](crate::MockTerminal), which records calls instead of touching a TTY.
pub trait TerminalBackend: Send + Sync + 'static {
    /// Opaque snapshot of the configuration in effect before raw mode was applied.
    type Saved: Send + std::fmt::Debug + 'static;

    /// Captures the current configuration, then applies raw mode.
    ///
    /// # Errors
    ///
    /// If the terminal can't be queried or configured.
    fn enter_raw_mode(&self, flavor: RawModeFlavor) -> miette::Result<Self::Saved>;

    /// Puts `saved` back.
    ///
    /// # Errors
    ///
    /// If the terminal can't be configured.
    fn restore(&self, saved: &Self::Saved) -> miette::Result<()>;

    /// Writes fixed control bytes to the terminal control channel (stdout) and flushes.
    ///
    /// # Errors
    ///
    /// If the write or flush fails.
    fn write_control_sequence(&self, bytes: &[u8]) -> miette::Result<()>;
}

/// [`TerminalBackend`] on top of rustix termios and the process's stdout.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RustixTerminal;

#[cfg(unix)]
impl TerminalBackend for RustixTerminal {
    type Saved = crate::SavedTerminalConfig;

    fn enter_raw_mode(&self, flavor: RawModeFlavor) -> miette::Result<Self::Saved> {
        crate::capture_and_enable_raw_mode(flavor)
    }

    fn restore(&self, saved: &Self::Saved) -> miette::Result<()> {
        crate::restore_terminal_config(saved)
    }

    fn write_control_sequence(&self, bytes: &[u8]) -> miette::Result<()> {
        use miette::IntoDiagnostic as _;
        use std::io::Write as _;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes).into_diagnostic()?;
        stdout.flush().into_diagnostic()
    }
}

/// Owns the [`TerminalBackend::Saved`] snapshot for the duration of one interactive
/// session and guarantees it is restored exactly once.
///
/// [`leave()`] may be reached from several paths (an explicit terminate, a fatal stream
/// error on the collector thread, a termination signal, or [`Drop`] of the pipeline).
/// An [`AtomicBool`] swap picks exactly one of them to perform the restore; the others
/// are no-ops.
///
/// ```text
/// enter():  raw mode ──▶ mouse tracking on ──▶ cursor hidden ──▶ active = true
/// leave():  active.swap(false)? ──▶ mouse tracking off ──▶ cursor shown ──▶ restore
/// ```
///
/// [`leave()`]: Self::leave
#[derive(Debug)]
pub struct ModeController<B: TerminalBackend> {
    backend: B,
    raw_mode: RawModeFlavor,
    features: TerminalFeatures,
    saved: Mutex<Option<B::Saved>>,
    active: AtomicBool,
}

impl<B: TerminalBackend> ModeController<B> {
    #[must_use]
    pub fn new(backend: B, raw_mode: RawModeFlavor, features: TerminalFeatures) -> Self {
        Self {
            backend,
            raw_mode,
            features,
            saved: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B { &self.backend }

    #[must_use]
    pub fn is_active(&self) -> bool { self.active.load(Ordering::SeqCst) }

    /// Enters interactive mode. A no-op if already active.
    ///
    /// If writing the enable sequences fails, raw mode is undone before the error is
    /// returned, so a failed entry leaves nothing to restore.
    ///
    /// # Errors
    ///
    /// If raw mode can't be applied or the control sequences can't be written.
    pub fn enter(&self) -> miette::Result<()> {
        if self.is_active() {
            return Ok(());
        }

        let saved = self.backend.enter_raw_mode(self.raw_mode)?;

        let enter_sequence = self.features.enter_sequence();
        if !enter_sequence.is_empty()
            && let Err(error) = self.backend.write_control_sequence(&enter_sequence)
        {
            if let Err(restore_error) = self.backend.restore(&saved) {
                tracing::warn!(
                    message = "term_input: failed to undo raw mode after enter error",
                    error = ?restore_error
                );
            }
            return Err(error);
        }

        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(saved);
        self.active.store(true, Ordering::SeqCst);

        tracing::debug!(
            message = "term_input: entered interactive mode",
            raw_mode = self.raw_mode.as_ref(),
            features = ?self.features
        );
        Ok(())
    }

    /// Leaves interactive mode if this call wins the race to do so.
    ///
    /// Returns `Ok(true)` when this call performed the restore, `Ok(false)` when there
    /// was nothing to do (never entered, or another path already restored).
    ///
    /// The disable sequences are best-effort: a failure to write them is logged and the
    /// saved configuration is still restored.
    ///
    /// # Errors
    ///
    /// If the saved configuration can't be written back.
    pub fn leave(&self) -> miette::Result<bool> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }

        let maybe_saved = self
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let leave_sequence = self.features.leave_sequence();
        if !leave_sequence.is_empty()
            && let Err(error) = self.backend.write_control_sequence(&leave_sequence)
        {
            tracing::warn!(
                message = "term_input: failed to write leave sequence",
                error = ?error
            );
        }

        if let Some(saved) = maybe_saved {
            self.backend.restore(&saved)?;
        }

        tracing::debug!(message = "term_input: left interactive mode");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTerminal;
    use pretty_assertions::assert_eq;
    use std::{sync::Arc, thread};

    fn new_controller() -> ModeController<MockTerminal> {
        ModeController::new(
            MockTerminal::default(),
            RawModeFlavor::Partial,
            TerminalFeatures::default(),
        )
    }

    #[test]
    fn test_enter_then_leave_restores_once() {
        let controller = new_controller();
        controller.enter().unwrap();
        assert!(controller.is_active());
        assert_eq!(controller.backend().enter_count(), 1);

        assert!(controller.leave().unwrap());
        assert!(!controller.leave().unwrap());
        assert!(!controller.is_active());
        assert_eq!(controller.backend().restore_count(), 1);
    }

    #[test]
    fn test_enter_twice_is_a_no_op() {
        let controller = new_controller();
        controller.enter().unwrap();
        controller.enter().unwrap();
        assert_eq!(controller.backend().enter_count(), 1);
    }

    #[test]
    fn test_leave_without_enter_does_nothing() {
        let controller = new_controller();
        assert!(!controller.leave().unwrap());
        assert_eq!(controller.backend().restore_count(), 0);
        assert!(controller.backend().written_bytes().is_empty());
    }

    #[test]
    fn test_control_sequences_are_written_in_order() {
        let controller = new_controller();
        controller.enter().unwrap();
        controller.leave().unwrap();
        let expected = [
            TerminalFeatures::default().enter_sequence(),
            TerminalFeatures::default().leave_sequence(),
        ]
        .concat();
        assert_eq!(controller.backend().written_bytes(), expected);
    }

    #[test]
    fn test_enter_failure_leaves_nothing_to_restore() {
        let controller = ModeController::new(
            MockTerminal::default().with_failing_enter(),
            RawModeFlavor::Full,
            TerminalFeatures::default(),
        );
        assert!(controller.enter().is_err());
        assert!(!controller.is_active());
        assert!(!controller.leave().unwrap());
        assert_eq!(controller.backend().restore_count(), 0);
    }

    #[test]
    fn test_write_failure_on_enter_undoes_raw_mode() {
        let controller = ModeController::new(
            MockTerminal::default().with_failing_writes(),
            RawModeFlavor::Partial,
            TerminalFeatures::default(),
        );
        assert!(controller.enter().is_err());
        assert!(!controller.is_active());
        assert_eq!(controller.backend().enter_count(), 1);
        assert_eq!(controller.backend().restore_count(), 1);
    }

    #[test]
    fn test_concurrent_leave_restores_exactly_once() {
        let controller = Arc::new(new_controller());
        controller.enter().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || controller.leave().unwrap())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|it| it.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(controller.backend().restore_count(), 1);
    }

    #[test]
    fn test_restore_once_per_entry() {
        let controller = new_controller();
        for _ in 0..3 {
            controller.enter().unwrap();
            controller.leave().unwrap();
        }
        assert_eq!(controller.backend().enter_count(), 3);
        assert_eq!(controller.backend().restore_count(), 3);
    }
}
