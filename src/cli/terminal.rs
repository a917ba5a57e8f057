//! Terminal capability detection and colouring

use owo_colors::{OwoColorize, colors::css};

/// Whether stdout can show colour.
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Terminal width, if stdout is a terminal.
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Narrow terminals (< 60 columns) get stacked rather than tabular output.
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(|w| w < 60)
}

/// Colours text for stdout when the terminal supports it.
pub trait Colorize {
    /// Passing result (green)
    fn success(&self) -> String;
    /// Warning (amber)
    fn warning(&self) -> String;
    /// Failure (red)
    fn failure(&self) -> String;
    /// Headings (blue)
    fn info(&self) -> String;
    /// Secondary text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    fn failure(&self) -> String {
        paint(self, |s| s.fg::<css::Red>().to_string())
    }

    fn info(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

fn paint(text: &str, style: impl Fn(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}
