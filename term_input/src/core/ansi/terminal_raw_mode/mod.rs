// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Terminal raw mode for ANSI terminals.
//!
//! ## Raw Mode vs Cooked Mode
//!
//! **Cooked Mode** (default):
//! - Input is line-buffered (waits for Enter key)
//! - Special characters are interpreted (Ctrl+C, Ctrl+Z, Ctrl+S, etc.)
//! - Echoing is enabled (typed characters appear on screen)
//!
//! **Raw Mode**:
//! - No line buffering - bytes available immediately
//! - No special character processing - all bytes pass through
//! - No echo - typed characters don't automatically appear
//!
//! Two flavors are supported, see [`RawModeFlavor`]. Unlike a process global "saved
//! termios", the original settings are returned to the caller as a
//! [`SavedTerminalConfig`] and owned by whoever entered raw mode (the
//! [`ModeController`]).
//!
//! ## Platform Support
//!
//! - **Unix/Linux/macOS**: Uses rustix's safe termios API
//!
//! [`ModeController`]: crate::ModeController

// Attach sources.
pub mod raw_mode_core;
#[cfg(unix)]
pub mod raw_mode_unix;

// Re-export.
pub use raw_mode_core::*;
#[cfg(unix)]
pub use raw_mode_unix::*;
