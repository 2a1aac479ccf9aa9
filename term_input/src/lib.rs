// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGINT SIGTERM

//! # r3bl_term_input
//!
//! A low level terminal input pipeline. It places the terminal into raw mode, captures
//! every keystroke and mouse event as raw bytes from stdin, and hands those bytes to
//! the application through blocking (optionally with a timeout) or non-blocking reads.
//! It stays correct under `SIGINT` / `SIGTERM` and under sustained high frequency
//! input.
//!
//! Bytes are opaque. Escape sequences (arrow keys, SGR mouse reports) are delivered
//! byte by byte and never interpreted.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌────────────────────┐   ┌─────────────┐
//! │ stdin, SIGs  │──▶│ input collector  │──▶│ BoundedByteChannel │──▶│ get_char()  │
//! └──────────────┘   │ (own thread)     │   │ (mutex + condvar)  │   │ (consumers) │
//!                    └────────┬─────────┘   └────────────────────┘   └─────────────┘
//!                             │ stop
//!                             ▼
//!                    ┌──────────────────┐
//!                    │ ModeController   │ restore the terminal exactly once
//!                    └──────────────────┘
//! ```
//!
//! | Component              | Type                      |
//! | :--------------------- | :------------------------ |
//! | Mode Controller        | [`ModeController`]        |
//! | Bounded Byte Channel   | [`BoundedByteChannel`]    |
//! | Input Collector        | [`MioCollectorWorker`]    |
//! | Lifecycle Manager      | [`TermInput`]             |
//!
//! # Example
//!
//! ```no_run
//! use r3bl_term_input::{GetCharStatus, TermInput, TermInputConfig};
//!
//! let term_input = TermInput::new(TermInputConfig::default());
//! term_input.initialize()?;
//! let mut byte = 0;
//! while term_input.get_char_status(&mut byte, true) == GetCharStatus::Ok {
//!     if byte == b'q' {
//!         break;
//!     }
//! }
//! term_input.terminate()?;
//! # Ok::<(), r3bl_term_input::TermInputError>(())
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`]. Raw mode owns the terminal, so send logs to a
//! file, see [`try_initialize_logging_global()`] and [`TracingConfig::new_file()`].

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap().
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules (re-exported below to provide clean public API).
pub mod core;
pub mod term_input;

// Re-export stable public API using glob imports for ergonomic, flat API surface.
#[allow(ambiguous_glob_reexports)]
pub use core::*;
#[allow(ambiguous_glob_reexports)]
pub use term_input::*;
