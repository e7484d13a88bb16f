use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "saplens",
    about = "Extract, classify and index clinical statistical analysis plans"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// SAP corpus directory (defaults to <data-dir>/sap)
    #[arg(long, global = true)]
    pub corpus: Option<PathBuf>,

    /// Document extensions to index (repeatable, defaults to pdf, docx, doc)
    #[arg(long = "ext", global = true)]
    pub extensions: Vec<String>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the study index from every document in the corpus
    Index,
    /// Summarize a single document without touching the index
    Parse {
        /// Path to a PDF, DOCX or DOC file
        file: PathBuf,
    },
    /// Show the comprehensive analysis of an indexed study
    Analyze {
        /// Study id, e.g. oncology_abc123
        study_id: String,
    },
    /// Find indexed studies by phase, therapeutic area and indication
    Find(FindArgs),
    /// Browse saved research papers
    Papers {
        #[command(subcommand)]
        action: PapersAction,
    },
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct FindArgs {
    /// Clinical trial phase, e.g. "Phase II"
    #[arg(long)]
    pub phase: Option<String>,

    /// Therapeutic area, e.g. Oncology
    #[arg(long)]
    pub therapeutic: Option<String>,

    /// Indication under study, e.g. "Lung Cancer"
    #[arg(long)]
    pub indication: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum PapersAction {
    /// List topic folders with saved papers
    Topics,
    /// Show the papers saved for a topic
    Show {
        /// Research topic
        topic: String,
    },
    /// Show one saved paper by id
    Info {
        /// Paper id
        id: String,
    },
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

impl CompletionsArgs {
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "saplens",
            &mut std::io::stdout(),
        );
    }
}
