//! Output formatting for CLI commands

use std::io;

use is_terminal::IsTerminal;

use cdcr::{Fragment, Highlight};

/// Wrap `text` in an ANSI color when stdout is a terminal.
pub fn color(code: &str, text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

fn ansi_code(highlight: Highlight<'_>) -> &'static str {
    match highlight {
        Highlight::Primary => "1;33",
        Highlight::Secondary(_) => "32",
        Highlight::Muted => "36",
    }
}

fn markers(highlight: Highlight<'_>) -> (&'static str, &'static str) {
    match highlight {
        Highlight::Primary => ("[", "]"),
        Highlight::Secondary(_) => ("<", ">"),
        Highlight::Muted => ("", ""),
    }
}

/// Render fragments for a terminal.
///
/// With `ansi`, wrappers become colors (nested wrappers restore the enclosing
/// color on close). Without, the primary is bracketed `[..]`, secondaries
/// are angled `<..>` and muted mentions are left plain.
pub fn paint<'t>(fragments: impl IntoIterator<Item = Fragment<'t>>, ansi: bool) -> String {
    let mut out = String::new();
    let mut stack: Vec<&'static str> = Vec::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => out.push_str(text),
            Fragment::Open(wrapper) if ansi => {
                let code = ansi_code(wrapper.highlight);
                stack.push(code);
                out.push_str(&format!("\x1b[{}m", code));
            }
            Fragment::Close(_) if ansi => {
                stack.pop();
                out.push_str("\x1b[0m");
                if let Some(code) = stack.last() {
                    out.push_str(&format!("\x1b[{}m", code));
                }
            }
            Fragment::Open(wrapper) => out.push_str(markers(wrapper.highlight).0),
            Fragment::Close(wrapper) => out.push_str(markers(wrapper.highlight).1),
        }
    }
    out
}
