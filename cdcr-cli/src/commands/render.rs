//! Render command: print a document with its mentions highlighted

use std::io;
use std::path::PathBuf;

use clap::Parser;
use is_terminal::IsTerminal;

use cdcr::{render_html, DocumentSide, Settings};

use crate::output::paint;
use crate::parser::SideArg;
use crate::utils::{load_selection, load_task};

/// Print a document with its mentions highlighted
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Task JSON file (`-` for stdin)
    #[arg(value_name = "TASK")]
    pub task: PathBuf,

    /// Which document to render
    #[arg(short, long, value_enum, default_value = "news")]
    pub side: SideArg,

    /// Show every mention, overriding the settings
    #[arg(long, conflicts_with = "marked_only")]
    pub all: bool,

    /// Show only the primary and secondary mentions
    #[arg(long)]
    pub marked_only: bool,

    /// Selection JSON (`{"news": [...], "science": [...]}`); seeded from related answers if absent
    #[arg(long, value_name = "FILE")]
    pub selection: Option<PathBuf>,

    /// Emit HTML instead of terminal text
    #[arg(long)]
    pub html: bool,
}

pub fn run(args: RenderArgs, settings: &Settings) -> Result<(), String> {
    let task = load_task(&args.task)?;
    let selection = load_selection(args.selection.as_deref(), &task)?;
    let side = DocumentSide::from(args.side);

    let tree = task
        .span_tree(side)
        .map_err(|e| format!("Failed to build {} mentions: {}", side, e))?;

    let show_all = if args.all {
        true
    } else if args.marked_only {
        false
    } else {
        settings.show_all
    };
    let options = settings
        .render_options(&task, &selection, side)
        .show_all(show_all);

    if args.html {
        println!("{}", render_html(tree.render(&options)));
    } else {
        println!("{}", paint(tree.render(&options), io::stdout().is_terminal()));
    }
    Ok(())
}
