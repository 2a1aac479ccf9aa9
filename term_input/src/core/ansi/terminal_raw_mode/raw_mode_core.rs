// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Platform independent raw mode types.

/// How much of the terminal's line discipline to switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::AsRefStr)]
pub enum RawModeFlavor {
    /// Clears `ICRNL` and `IXON` (input), `ECHO`, `ICANON`, `IEXTEN` and `ISIG` (local).
    /// Output processing (`OPOST`) stays on, so the application can keep printing with
    /// `\n`. Ctrl+C arrives as byte `0x03` instead of raising `SIGINT`.
    #[default]
    Partial,
    /// Everything `cfmakeraw()` does, including `OPOST`.
    Full,
}
