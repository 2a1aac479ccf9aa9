// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Stand-ins for the terminal and the input stream, so the pipeline can be exercised
//! without a TTY. These are public so that downstream crates can test code built on
//! [`TermInput`](crate::TermInput) the same way.

// Attach sources.
pub mod mock_terminal;
pub mod recording_sink;
pub mod scripted_input_worker;

// Re-export.
pub use mock_terminal::*;
pub use recording_sink::*;
pub use scripted_input_worker::*;
