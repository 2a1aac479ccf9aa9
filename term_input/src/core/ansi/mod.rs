// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod control_sequences;
pub mod terminal_raw_mode;

// Re-export.
pub use control_sequences::*;
pub use terminal_raw_mode::*;
