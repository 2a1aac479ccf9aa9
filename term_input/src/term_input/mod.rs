// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Enable or disable per-byte trace logging on the collector thread.
pub const DEBUG_TERM_INPUT_SHOW_BYTES: bool = false;

// Attach sources.
pub mod byte_channel;
pub mod byte_ring_buffer;
pub mod input_collector;
pub mod input_pipeline;
pub mod mode_controller;
pub mod run_state;
pub mod term_input_config;
pub mod term_input_error;

// Re-export.
pub use byte_channel::*;
pub use byte_ring_buffer::*;
pub use input_collector::*;
pub use input_pipeline::*;
pub use mode_controller::*;
pub use run_state::*;
pub use term_input_config::*;
pub use term_input_error::*;
