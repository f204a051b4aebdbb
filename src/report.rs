//! Uniform printing of errors: a title banner followed by an indented body

use std::io::IsTerminal;

use anstyle::{AnsiColor, Reset, Style};

use crate::error::RouterError;

const ERROR_COLOR: Style = Style::new()
    .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)))
    .bold();
const DIM: Style = Style::new().dimmed();

/// Render `err` for a terminal; escape codes only when `color` is set
#[must_use]
pub fn format_error(err: &RouterError, color: bool) -> String {
    let (error_style, dim) = if color {
        (ERROR_COLOR, DIM)
    } else {
        (Style::new(), Style::new())
    };
    let reset = if color { Reset.render().to_string() } else { String::new() };
    let mut out = format!("\n{error_style}✘ {}{reset}\n\n", err.title());
    for line in err.to_string().lines() {
        out.push_str(&format!("  {dim}│{reset} {line}\n"));
    }
    out.push('\n');
    out
}

/// Print `err` to stderr, colored when stderr is a terminal
pub fn print_error(err: &RouterError) {
    eprint!("{}", format_error(err, std::io::stderr().is_terminal()));
}
