//! ANSI color constants and helpers for terminal rendering.
//!
//! The renderers in [`crate::task::status`] and [`crate::commands::help`]
//! compose their output from these constants so that color handling stays in
//! one place.

/// Bold text.
pub const BOLD_WHITE: &str = "\x1b[1m";
/// Bright red, used for error highlights and category headers.
pub const RED: &str = "\x1b[91m";
/// Bright green, used for passing status glyphs.
pub const OK_GREEN: &str = "\x1b[92m";
/// Bright yellow.
pub const YELLOW: &str = "\x1b[93m";
/// Dim gray, used for pending status glyphs.
pub const GRAY: &str = "\x1b[90m";
/// Reset all attributes.
pub const ENDC: &str = "\x1b[0m";

/// Wrap `txt` in a color code and a reset.
#[must_use]
pub fn paint(color: &str, txt: &str) -> String {
    format!("{color}{txt}{ENDC}")
}

/// Shorthand for [`paint`] with [`OK_GREEN`].
#[must_use]
pub fn green(txt: &str) -> String {
    paint(OK_GREEN, txt)
}

/// Shorthand for [`paint`] with [`GRAY`].
#[must_use]
pub fn gray(txt: &str) -> String {
    paint(GRAY, txt)
}

/// Shorthand for [`paint`] with [`BOLD_WHITE`].
#[must_use]
pub fn bold(txt: &str) -> String {
    paint(BOLD_WHITE, txt)
}
