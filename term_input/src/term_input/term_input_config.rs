// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ClosePolicy, RawModeFlavor, TerminalFeatures};
use std::time::Duration;

/// Number of bytes the channel holds before it starts dropping new input.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_000;

/// Longest the collector waits for input before re-checking whether it should exit.
pub const DEFAULT_COLLECTOR_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Longest a blocked consumer sleeps before re-checking the closed flag.
pub const DEFAULT_CONSUMER_RECHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`TermInput`](crate::TermInput).
///
/// ```
/// use r3bl_term_input::{ClosePolicy, RawModeFlavor, TermInputConfig};
///
/// let config = TermInputConfig::default()
///     .with_raw_mode(RawModeFlavor::Full)
///     .with_mouse_tracking(false)
///     .with_close_policy(ClosePolicy::CloseImmediately);
/// assert_eq!(config.channel_capacity, 1_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermInputConfig {
    pub channel_capacity: usize,
    pub collector_poll_interval: Duration,
    pub consumer_recheck_interval: Duration,
    pub raw_mode: RawModeFlavor,
    /// Button, drag, and SGR extended mouse reporting.
    pub enable_mouse_tracking: bool,
    pub hide_cursor: bool,
    pub close_policy: ClosePolicy,
    /// Signals that stop the pipeline and restore the terminal.
    pub termination_signals: Vec<i32>,
}

impl Default for TermInputConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            collector_poll_interval: DEFAULT_COLLECTOR_POLL_INTERVAL,
            consumer_recheck_interval: DEFAULT_CONSUMER_RECHECK_INTERVAL,
            raw_mode: RawModeFlavor::default(),
            enable_mouse_tracking: true,
            hide_cursor: true,
            close_policy: ClosePolicy::default(),
            termination_signals: default_termination_signals(),
        }
    }
}

#[cfg(unix)]
fn default_termination_signals() -> Vec<i32> {
    vec![signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM]
}

#[cfg(not(unix))]
fn default_termination_signals() -> Vec<i32> { vec![] }

impl TermInputConfig {
    /// Clamped to at least `1`.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_collector_poll_interval(mut self, interval: Duration) -> Self {
        self.collector_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_consumer_recheck_interval(mut self, interval: Duration) -> Self {
        self.consumer_recheck_interval = interval;
        self
    }

    #[must_use]
    pub fn with_raw_mode(mut self, raw_mode: RawModeFlavor) -> Self {
        self.raw_mode = raw_mode;
        self
    }

    #[must_use]
    pub fn with_mouse_tracking(mut self, enabled: bool) -> Self {
        self.enable_mouse_tracking = enabled;
        self
    }

    #[must_use]
    pub fn with_hide_cursor(mut self, hide: bool) -> Self {
        self.hide_cursor = hide;
        self
    }

    #[must_use]
    pub fn with_close_policy(mut self, close_policy: ClosePolicy) -> Self {
        self.close_policy = close_policy;
        self
    }

    #[must_use]
    pub fn with_termination_signals(mut self, signals: impl Into<Vec<i32>>) -> Self {
        self.termination_signals = signals.into();
        self
    }

    #[must_use]
    pub fn terminal_features(&self) -> TerminalFeatures {
        TerminalFeatures {
            mouse_tracking: self.enable_mouse_tracking,
            hide_cursor: self.hide_cursor,
        }
    }
}
