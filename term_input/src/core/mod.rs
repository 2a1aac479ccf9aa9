// Copyright (c) 2022-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Ambient infrastructure shared by the input pipeline: control flow enums, error
//! reporting, logging, fixed ANSI control sequences, terminal raw mode, and test
//! fixtures.

// Attach sources.
pub mod ansi;
pub mod common;
pub mod log;
pub mod test_fixtures;

// Re-export.
pub use ansi::*;
pub use common::*;
pub use log::*;
pub use test_fixtures::*;
