use clap::Parser;
use saplens::{
    DataDir,
    EngineConfig,
    PaperStore,
    cli::{Cli, Command, FindArgs, PapersAction},
    error,
    ingestion,
    mcp,
    query,
    study_index::FindCriteria,
    text_source::DocumentText,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SAPLENS_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let corpus = cli.corpus.unwrap_or_else(|| data_dir.corpus_dir());
    let mut config = EngineConfig::new(corpus);
    if !cli.extensions.is_empty() {
        config = config.with_extensions(&cli.extensions);
    }
    let papers = PaperStore::new(data_dir.papers_dir());

    match cli.command {
        Command::Index => {
            let report = ingestion::rebuild_index(&config, &DocumentText)?;
            println!("{report}");
        }
        Command::Parse { file } => {
            print_json(&query::parse_for_index(&DocumentText, &file)?)?;
        }
        Command::Analyze { study_id } => {
            print_json(&query::analyze_study(
                &config,
                &DocumentText,
                &study_id,
            )?)?;
        }
        Command::Find(args) => {
            print_json(&query::find_studies(&config, &find_criteria(args))?)?;
        }
        Command::Papers { action } => cmd_papers(&papers, action)?,
        Command::Mcp => mcp::run_mcp(config, papers)?,
        Command::Completions(_) => {}
    }

    Ok(())
}

fn find_criteria(args: FindArgs) -> FindCriteria {
    FindCriteria {
        phase: args.phase,
        therapeutic: args.therapeutic,
        indication: args.indication,
    }
}

fn cmd_papers(papers: &PaperStore, action: PapersAction) -> error::Result<()> {
    match action {
        PapersAction::Topics => print!("{}", papers.render_folders()?),
        PapersAction::Show { topic } => {
            println!("{}", papers.render_topic(&topic));
        }
        PapersAction::Info { id } => match papers.find(&id)? {
            Some(info) => print_json(&info)?,
            None => {
                println!("There's no saved information related to paper {id}.")
            }
        },
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> error::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
