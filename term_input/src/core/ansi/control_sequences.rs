// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fixed DEC private mode sequences written to the terminal when entering and leaving
//! interactive mode. These are opaque literals, never computed.
//!
//! | Mode   | Meaning                                                    |
//! | :----- | :--------------------------------------------------------- |
//! | `1002` | Button event tracking (press, release, motion while held)  |
//! | `1006` | SGR extended coordinates, so columns > 223 are reportable  |
//! | `25`   | Text cursor visibility                                     |

/// Button press/release + drag tracking, followed by SGR extended mouse mode.
pub const ENABLE_MOUSE_TRACKING: &[u8] = b"\x1b[?1002h\x1b[?1006h";

/// Inverse of [`ENABLE_MOUSE_TRACKING`], in reverse order.
pub const DISABLE_MOUSE_TRACKING: &[u8] = b"\x1b[?1006l\x1b[?1002l";

pub const HIDE_CURSOR: &[u8] = b"\x1b[?25l";

pub const SHOW_CURSOR: &[u8] = b"\x1b[?25h";

/// Which auxiliary terminal features to toggle alongside raw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalFeatures {
    pub mouse_tracking: bool,
    pub hide_cursor: bool,
}

impl Default for TerminalFeatures {
    fn default() -> Self {
        Self {
            mouse_tracking: true,
            hide_cursor: true,
        }
    }
}

impl TerminalFeatures {
    /// Bytes to write after raw mode has been applied.
    #[must_use]
    pub fn enter_sequence(self) -> Vec<u8> {
        let mut acc = Vec::new();
        if self.mouse_tracking {
            acc.extend_from_slice(ENABLE_MOUSE_TRACKING);
        }
        if self.hide_cursor {
            acc.extend_from_slice(HIDE_CURSOR);
        }
        acc
    }

    /// Bytes to write before the saved terminal configuration is restored.
    #[must_use]
    pub fn leave_sequence(self) -> Vec<u8> {
        let mut acc = Vec::new();
        if self.mouse_tracking {
            acc.extend_from_slice(DISABLE_MOUSE_TRACKING);
        }
        if self.hide_cursor {
            acc.extend_from_slice(SHOW_CURSOR);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enter_and_leave_sequences() {
        let features = TerminalFeatures::default();
        assert_eq!(
            features.enter_sequence(),
            b"\x1b[?1002h\x1b[?1006h\x1b[?25l".to_vec()
        );
        assert_eq!(
            features.leave_sequence(),
            b"\x1b[?1006l\x1b[?1002l\x1b[?25h".to_vec()
        );
    }

    #[test]
    fn test_no_features_writes_nothing() {
        let features = TerminalFeatures {
            mouse_tracking: false,
            hide_cursor: false,
        };
        assert!(features.enter_sequence().is_empty());
        assert!(features.leave_sequence().is_empty());
    }
}
