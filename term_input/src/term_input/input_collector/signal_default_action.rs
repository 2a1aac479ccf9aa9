// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Keeps the default action of termination signals alive between sessions.
//!
//! [`signal_hook`] chains to the previous handler, but `SIG_DFL` can't be chained to,
//! and removing the last registration does not reinstall it. Dropping [`Signals`] at
//! the end of a session would therefore leave `SIGINT` and `SIGTERM` doing nothing
//! for the rest of the process.
//!
//! So the first time a signal is used as a termination signal, a conditional default
//! action is registered for it, once per process. The condition is armed whenever no
//! [`DefaultActionSuspension`] is alive:
//!
//! | Pipeline state          | Termination signal does                    |
//! | :---------------------- | :----------------------------------------- |
//! | Running (suspension)    | Stops the pipeline, see [`Signals`]        |
//! | Not running             | Its default action (terminate the process) |
//!
//! A signal whose previous disposition was `SIG_IGN` gets its default action outside a
//! session too. Don't list signals the host ignores as termination signals.
//!
//! [`Signals`]: signal_hook_mio::v1_0::Signals

use signal_hook::{consts::FORBIDDEN, flag::register_conditional_default};
use std::{io,
          sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError,
                 atomic::{AtomicBool, Ordering}}};

/// `true` while the default action should run, which is whenever no session is
/// running.
static DEFAULT_ACTION_ARMED: LazyLock<Arc<AtomicBool>> =
    LazyLock::new(|| Arc::new(AtomicBool::new(true)));

static REGISTRY: Mutex<DefaultActionRegistry> = Mutex::new(DefaultActionRegistry {
    registered_signals: Vec::new(),
    live_suspensions: 0,
});

#[derive(Debug)]
struct DefaultActionRegistry {
    /// Signals that already carry a conditional default action. Registrations are
    /// never removed.
    registered_signals: Vec<i32>,
    live_suspensions: usize,
}

/// Only plain counters live behind the lock, so recover from poisoning.
fn lock_registry() -> MutexGuard<'static, DefaultActionRegistry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Disarms the default action of termination signals while alive. Held by a running
/// collector; see the [module docs](self).
#[derive(Debug)]
pub struct DefaultActionSuspension {
    _private: (),
}

impl DefaultActionSuspension {
    /// Registers the conditional default action for any of `signals` that don't have
    /// one yet, then disarms it until the returned value is dropped.
    ///
    /// # Errors
    ///
    /// - [`io::ErrorKind::InvalidInput`] for a signal that can't be handled, like
    ///   `SIGKILL`. Checked before anything is registered.
    /// - Any error from installing the handler.
    pub fn acquire(signals: &[i32]) -> io::Result<Self> {
        if let Some(forbidden) = signals.iter().find(|signal| FORBIDDEN.contains(*signal)) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("signal {forbidden} can't be handled"),
            ));
        }

        let mut registry = lock_registry();
        for signal in signals {
            if registry.registered_signals.contains(signal) {
                continue;
            }
            register_conditional_default(*signal, Arc::clone(&DEFAULT_ACTION_ARMED))?;
            registry.registered_signals.push(*signal);
        }
        registry.live_suspensions += 1;
        DEFAULT_ACTION_ARMED.store(false, Ordering::SeqCst);

        Ok(Self { _private: () })
    }
}

impl Drop for DefaultActionSuspension {
    fn drop(&mut self) {
        let mut registry = lock_registry();
        registry.live_suspensions = registry.live_suspensions.saturating_sub(1);
        if registry.live_suspensions == 0 {
            DEFAULT_ACTION_ARMED.store(true, Ordering::SeqCst);
        }
    }
}

/// `true` if a termination signal arriving now would get its default action.
#[must_use]
pub fn is_default_action_armed() -> bool { DEFAULT_ACTION_ARMED.load(Ordering::SeqCst) }

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use signal_hook::consts::{SIGKILL, SIGUSR2};

    #[test]
    #[serial]
    fn test_armed_only_while_no_suspension_is_alive() {
        assert!(is_default_action_armed());

        let first = DefaultActionSuspension::acquire(&[SIGUSR2]).unwrap();
        assert!(!is_default_action_armed());
        let second = DefaultActionSuspension::acquire(&[SIGUSR2]).unwrap();

        drop(first);
        assert!(!is_default_action_armed());
        drop(second);
        assert!(is_default_action_armed());

        assert_eq!(
            lock_registry()
                .registered_signals
                .iter()
                .filter(|signal| **signal == SIGUSR2)
                .count(),
            1
        );
    }

    #[test]
    #[serial]
    fn test_forbidden_signal_is_rejected_without_disarming() {
        let error = DefaultActionSuspension::acquire(&[SIGUSR2, SIGKILL]).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        assert!(is_default_action_armed());
    }
}
