//! Terminal colors for CLI output.

use std::io::{self, Write};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Wrap `text` in `color` and a reset.
pub fn paint(color: &str, text: &str) -> String {
    format!("{}{}{}", color, text, RESET)
}

/// Flush stdout so partial lines show up immediately.
#[inline]
pub fn flush_stdout() {
    io::stdout().flush().ok();
}

/// Horizontal rule used between sections.
pub fn rule() -> String {
    "─".repeat(50)
}
