//! CLI argument parsing and structure definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use cdcr::{Answer, DocumentSide};

/// Cross-document coreference annotation tools
#[derive(Parser)]
#[command(name = "cdcr")]
#[command(
    author,
    version,
    about = "Cross-document coreference annotation tools",
    long_about = r#"
cdcr - inspect and submit cross-document coreference tasks

A task pairs a news article with a science paper and asks whether one
mention from each refers to the same thing. Task files are the JSON the
task API returns.

EXAMPLES:
  cdcr question task.json
  cdcr render task.json --side news
  cdcr render task.json --side science --html > sci.html
  cdcr plan task.json --answer yes --selection sel.json --next
  cdcr validate tasks/*.json
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log more (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a document with its mentions highlighted
    #[command(visible_alias = "r")]
    Render(crate::commands::RenderArgs),

    /// Compute the write plan for an answer
    #[command(visible_alias = "p")]
    Plan(crate::commands::PlanArgs),

    /// Check task files for bad mention keys and crossing spans
    #[command(visible_alias = "v")]
    Validate(crate::commands::ValidateArgs),

    /// Print the question a task asks
    #[command(visible_alias = "q")]
    Question(crate::commands::QuestionArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Document side
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    /// News article
    News,
    /// Science paper
    #[value(alias = "sci")]
    Science,
}

impl From<SideArg> for DocumentSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::News => DocumentSide::News,
            SideArg::Science => DocumentSide::Science,
        }
    }
}

/// Yes/no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerArg {
    /// Same thing
    #[value(alias = "y")]
    Yes,
    /// Different things
    #[value(alias = "n")]
    No,
}

impl From<AnswerArg> for Answer {
    fn from(answer: AnswerArg) -> Self {
        match answer {
            AnswerArg::Yes => Answer::Yes,
            AnswerArg::No => Answer::No,
        }
    }
}
