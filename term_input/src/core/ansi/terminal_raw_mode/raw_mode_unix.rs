// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words cfmakeraw VMIN VTIME ICRNL IXON ICANON IEXTEN ISIG

//! Unix/Linux/macOS implementation of raw mode using rustix's safe termios API.

use super::RawModeFlavor;
use miette::miette;
use rustix::{fd::{AsFd, BorrowedFd},
             termios::{self, InputModes, LocalModes, OptionalActions, SpecialCodeIndex,
                       Termios}};
use std::{fs::File, io};

/// Snapshot of the terminal configuration taken right before raw mode was applied.
///
/// Opaque to everyone except [`restore_terminal_config()`].
#[derive(Debug, Clone)]
pub struct SavedTerminalConfig(Termios);

/// Represents either stdin or `/dev/tty` for terminal operations.
///
/// This enum allows us to handle both cases where stdin is a tty (normal terminal usage)
/// and where stdin is redirected (e.g., piped input), requiring us to use `/dev/tty`.
#[derive(Debug)]
enum TerminalFd {
    /// Using standard input (when it's a terminal)
    Stdin(io::Stdin),
    /// Using `/dev/tty` (when stdin is redirected)
    DevTty(File),
}

impl AsFd for TerminalFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            TerminalFd::Stdin(stdin) => stdin.as_fd(),
            TerminalFd::DevTty(file) => file.as_fd(),
        }
    }
}

/// Gets a file descriptor for the controlling terminal.
///
/// Checks if stdin is a tty and uses it if so; otherwise opens `/dev/tty`.
///
/// # Errors
///
/// Returns an error if stdin is not a tty and `/dev/tty` cannot be opened.
fn get_terminal_fd() -> io::Result<TerminalFd> {
    let stdin = io::stdin();
    if termios::isatty(&stdin) {
        Ok(TerminalFd::Stdin(stdin))
    } else {
        let file = File::options().read(true).write(true).open("/dev/tty")?;
        Ok(TerminalFd::DevTty(file))
    }
}

/// Captures the current terminal settings, then applies raw mode of the given flavor.
///
/// `VMIN = 1` and `VTIME = 0` in both flavors, so a `read()` that returns zero bytes
/// always means end-of-stream.
///
/// # Errors
///
/// Returns miette diagnostic errors if:
/// - Terminal file descriptor cannot be obtained
/// - Terminal attributes cannot be retrieved or set
pub fn capture_and_enable_raw_mode(
    flavor: RawModeFlavor,
) -> miette::Result<SavedTerminalConfig> {
    let fd = get_terminal_fd()
        .map_err(|e| miette!("failed to get terminal file descriptor: {e}"))?;

    let original = termios::tcgetattr(&fd)
        .map_err(|e| miette!("failed to retrieve terminal attributes: {e}"))?;

    let mut termios = original.clone();
    match flavor {
        RawModeFlavor::Partial => {
            termios
                .input_modes
                .remove(InputModes::ICRNL | InputModes::IXON);
            termios.local_modes.remove(
                LocalModes::ECHO | LocalModes::ICANON | LocalModes::IEXTEN | LocalModes::ISIG,
            );
        }
        RawModeFlavor::Full => termios.make_raw(),
    }
    termios.special_codes[SpecialCodeIndex::VMIN] = 1;
    termios.special_codes[SpecialCodeIndex::VTIME] = 0;

    termios::tcsetattr(&fd, OptionalActions::Flush, &termios)
        .map_err(|e| miette!("failed to set terminal attributes: {e}"))?;

    Ok(SavedTerminalConfig(original))
}

/// Writes `saved` back to the terminal.
///
/// # Errors
///
/// Returns miette diagnostic errors if:
/// - Terminal file descriptor cannot be obtained
/// - Terminal attributes cannot be set
pub fn restore_terminal_config(saved: &SavedTerminalConfig) -> miette::Result<()> {
    let fd = get_terminal_fd()
        .map_err(|e| miette!("failed to get terminal file descriptor: {e}"))?;

    termios::tcsetattr(&fd, OptionalActions::Flush, &saved.0)
        .map_err(|e| miette!("failed to set terminal attributes: {e}"))
}
