//! Question command: print what a task asks

use std::path::PathBuf;

use clap::Parser;

use crate::utils::load_task;

/// Print the question a task asks
#[derive(Parser, Debug)]
pub struct QuestionArgs {
    /// Task JSON file (`-` for stdin)
    #[arg(value_name = "TASK")]
    pub task: PathBuf,
}

pub fn run(args: QuestionArgs) -> Result<(), String> {
    let task = load_task(&args.task)?;
    println!("{}", task.question());
    if let Some(previous) = &task.current_user_answer {
        println!("(previously answered {})", previous.answer);
    }
    if task.is_bad {
        println!(
            "(flagged as bad: {})",
            task.is_bad_reason.as_deref().unwrap_or("no reason given")
        );
    }
    Ok(())
}
