// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::types::WorkflowKind;

#[derive(Parser)]
#[command(
    name = "tandem",
    about = "Two-role AI collaboration: a PM model reviews a Developer model's work until approved",
    version
)]
pub struct Cli {
    /// Config file path (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Budget mode preset: economy, balanced, or quality
    #[arg(short, long, global = true)]
    pub budget_mode: Option<String>,

    /// Override the preset's max iterations
    #[arg(short = 'i', long, global = true)]
    pub max_iterations: Option<u32>,

    /// Suppress progress output (only emit the final artifact)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Auto-continue at checkpoints without prompting
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Develop against requirements with a PM review loop
    Develop {
        /// Requirements text (reads stdin when omitted)
        requirements: Option<String>,
        /// Read requirements from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Review and iteratively improve existing code
    Review {
        /// Code to review (reads stdin when omitted)
        code: Option<String>,
        /// Read the code from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Additional context for the review
        #[arg(short = 'x', long)]
        context: Option<String>,
    },
    /// Produce a project plan
    Plan {
        /// Project description (reads stdin when omitted)
        project: Option<String>,
        /// Read the description from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Write documentation for a topic
    Docs {
        /// Topic to document (reads stdin when omitted)
        topic: Option<String>,
        /// Read the topic from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Additional context to work from
        #[arg(short = 'x', long)]
        context: Option<String>,
    },
    /// Pick the workflow from a menu, then read input from stdin
    Interactive,
}

impl Commands {
    /// Resolve the command into a workflow kind and request text.
    /// Returns `None` when interactive mode is quit from the menu.
    pub fn resolve(&self) -> anyhow::Result<Option<(WorkflowKind, String)>> {
        let (kind, inline, file, context) = match self {
            Commands::Develop { requirements, file } => {
                (WorkflowKind::Develop, requirements, file, None)
            }
            Commands::Review {
                code,
                file,
                context,
            } => (WorkflowKind::Review, code, file, context.as_deref()),
            Commands::Plan { project, file } => (WorkflowKind::Plan, project, file, None),
            Commands::Docs {
                topic,
                file,
                context,
            } => (WorkflowKind::Docs, topic, file, context.as_deref()),
            Commands::Interactive => return interactive_task(),
        };

        let mut input = read_text(inline, file)?;
        if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
            input.push_str("\n\nAdditional context:\n");
            input.push_str(ctx);
        }
        Ok(Some((kind, input)))
    }
}

/// Interactive mode: choose the workflow type from a menu, then read the
/// request from stdin. Choosing "quit" ends without running anything.
fn interactive_task() -> anyhow::Result<Option<(WorkflowKind, String)>> {
    let choice = inquire::Select::new(
        "Select workflow type",
        vec!["develop", "review", "plan", "docs", "quit"],
    )
    .prompt()?;

    let kind = match choice {
        "develop" => WorkflowKind::Develop,
        "review" => WorkflowKind::Review,
        "plan" => WorkflowKind::Plan,
        "docs" => WorkflowKind::Docs,
        _ => return Ok(None),
    };
    Ok(Some((kind, read_text(&None, &None)?)))
}

/// Positional/file input, falling back to stdin.
fn read_text(inline: &Option<String>, file: &Option<PathBuf>) -> anyhow::Result<String> {
    use std::io::Read;

    let input = if let Some(path) = file {
        std::fs::read_to_string(path)?
    } else if let Some(text) = inline {
        text.clone()
    } else {
        eprintln!("Enter your input (press Ctrl+D when done):");
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let input = input.trim().to_string();
    if input.is_empty() {
        anyhow::bail!("no input provided");
    }
    Ok(input)
}
