//! Plan command: compute the writes an answer would make

use std::path::PathBuf;

use clap::Parser;

use cdcr::CoreferencePropagator;

use crate::parser::AnswerArg;
use crate::utils::{load_selection, load_task};

/// Compute the write plan for an answer
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Task JSON file (`-` for stdin)
    #[arg(value_name = "TASK")]
    pub task: PathBuf,

    /// Answer for the task's pair
    #[arg(short, long, value_enum)]
    pub answer: AnswerArg,

    /// Selection JSON; seeded from related answers if absent
    #[arg(long, value_name = "FILE")]
    pub selection: Option<PathBuf>,

    /// Move on to a new question afterwards instead of reloading this one
    #[arg(long)]
    pub next: bool,

    /// Reject selected keys that are not mentions of their document
    #[arg(long)]
    pub strict: bool,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: PlanArgs) -> Result<(), String> {
    let task = load_task(&args.task)?;
    let selection = load_selection(args.selection.as_deref(), &task)?;

    let plan = CoreferencePropagator::new()
        .with_strict_selection(args.strict)
        .plan_submission(&task, &selection, args.answer.into(), args.next)
        .map_err(|e| format!("Cannot submit task {}: {}", task.id, e))?;

    let json = if args.compact {
        serde_json::to_string(&plan)
    } else {
        serde_json::to_string_pretty(&plan)
    }
    .map_err(|e| format!("Failed to serialize plan: {}", e))?;
    println!("{}", json);
    Ok(())
}
