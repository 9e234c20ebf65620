//! ANSI terminal colors.
//!
//! # Responsibilities
//! - Map the eight named colors to SGR foreground/background codes
//! - Produce bright (bold) variants and the reset sequence
//! - Paint text only when colors are enabled
//!
//! All functions are pure; there is no shared state.

/// One of the eight standard terminal colors.
///
/// Discriminants start at 1 so that `color + 29` yields the foreground
/// code and `color + 39` the background code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black = 1,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    fn foreground(self) -> u8 {
        self as u8 + 29
    }

    fn background(self) -> u8 {
        self as u8 + 39
    }
}

/// Normal-weight foreground sequence.
pub fn text(color: Color) -> String {
    format!("\x1b[{}m", color.foreground())
}

/// Bold foreground sequence.
pub fn bright_text(color: Color) -> String {
    format!("\x1b[1;{}m", color.foreground())
}

/// Combined foreground, weight and background sequence.
pub fn all(foreground: Color, bright: bool, background: Color) -> String {
    if bright {
        format!("\x1b[1;{};{}m", foreground.foreground(), background.background())
    } else {
        format!("\x1b[{};{}m", foreground.foreground(), background.background())
    }
}

/// Sequence that clears every attribute.
pub fn reset() -> &'static str {
    "\x1b[m"
}

/// Paints text when colors are enabled and passes it through otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Normal-weight foreground.
    pub fn text(&self, color: Color, s: &str) -> String {
        if self.enabled {
            format!("{}{}{}", text(color), s, reset())
        } else {
            s.to_string()
        }
    }

    /// Bold foreground.
    pub fn bright(&self, color: Color, s: &str) -> String {
        if self.enabled {
            format!("{}{}{}", bright_text(color), s, reset())
        } else {
            s.to_string()
        }
    }

    /// Black text on a colored background, used for identifier badges.
    pub fn badge(&self, background: Color, s: &str) -> String {
        if self.enabled {
            format!("{}{}{}", all(Color::Black, false, background), s, reset())
        } else {
            s.to_string()
        }
    }
}
