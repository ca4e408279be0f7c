//! Validate command: check task files before they reach annotators

use std::path::PathBuf;

use clap::Parser;

use cdcr::{find_crossings, DocumentSide, Mention, Task};

use crate::output::color;
use crate::utils::load_task;

/// Check task files for bad mention keys and crossing spans
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Task JSON files
    #[arg(required = true, value_name = "TASK")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn check_side(task: &Task, side: DocumentSide, report: &mut Report) {
    let text = task.text(side);
    let mut mentions = Vec::new();
    for key in task.mentions(side) {
        let mention = match Mention::from_key(text, key) {
            Ok(mention) => mention,
            Err(e) => {
                report.errors.push(format!("{} {}: {}", side, key, e));
                continue;
            }
        };
        if let Ok(actual) = Mention::new(text, mention.start(), mention.end()) {
            if actual.label() != key.label() {
                report.warnings.push(format!(
                    "{} {}: label does not match text {:?}",
                    side,
                    key,
                    actual.label()
                ));
            }
        }
        mentions.push(mention);
    }

    for (first, second) in find_crossings(&mentions) {
        report
            .errors
            .push(format!("{} crossing spans: {} and {}", side, first, second));
    }

    if let Some(primary) = task.primary(side) {
        if !task.mentions(side).contains(primary) {
            report
                .errors
                .push(format!("{} primary {} is not among its mentions", side, primary));
        }
    }
}

fn check(task: &Task) -> Report {
    let mut report = Report::default();
    if task.news_ent.is_none() && task.sci_ent.is_none() {
        report
            .errors
            .push("task has neither a news nor a science mention".to_string());
    }
    for side in [DocumentSide::News, DocumentSide::Science] {
        check_side(task, side, &mut report);
    }
    report
}

pub fn run(args: ValidateArgs) -> Result<(), String> {
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &args.files {
        let task = match load_task(file) {
            Ok(task) => task,
            Err(e) => {
                eprintln!("{} {}", color("31", "error"), e);
                total_errors += 1;
                continue;
            }
        };
        let report = check(&task);
        for error in &report.errors {
            eprintln!("{} {}: {}", color("31", "error"), file.display(), error);
        }
        for warning in &report.warnings {
            eprintln!("{} {}: {}", color("33", "warn"), file.display(), warning);
        }
        total_errors += report.errors.len();
        total_warnings += report.warnings.len();
    }

    println!();
    println!("Validated {} file(s)", args.files.len());
    if total_errors > 0 {
        println!("{} {} errors", color("31", "x"), total_errors);
    }
    if total_warnings > 0 {
        println!("{} {} warnings", color("33", "!"), total_warnings);
    }
    if total_errors == 0 && total_warnings == 0 {
        println!("{} All valid", color("32", "ok:"));
    }

    if total_errors > 0 {
        return Err(format!("{} validation errors", total_errors));
    }
    Ok(())
}
