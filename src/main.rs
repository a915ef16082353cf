use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lexgraph::config::Config;
use lexgraph::db::GraphDb;
use lexgraph::pipeline::{self, RunOutcome, Source};

#[derive(Parser)]
#[command(name = "lexgraph", version, about = "Load lexical datasets into a word/morph graph store")]
struct Cli {
    /// Pipeline configuration file (defaults are used when it does not exist)
    #[arg(long, global = true, default_value = "lexgraph.json")]
    config: PathBuf,

    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CommonArgs {
    /// Records per write transaction
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Language code for nodes and units
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Skip uniqueness constraint creation
    #[arg(long, global = true)]
    no_constraints: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Character decomposition from a frequency table and a word list
    Chars {
        #[arg(long)]
        freq: Option<PathBuf>,
        #[arg(long)]
        words: Option<PathBuf>,
    },
    /// Segmented derivational lexicon, pruned by corpus count
    Lexicon {
        #[arg(long)]
        data: Option<PathBuf>,
        /// Number of lexemes kept after pruning
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if cli.common.no_constraints {
        config.create_constraints = false;
    }

    let source = match cli.command {
        Command::Chars { freq, words } => {
            let chars = &mut config.chars;
            if let Some(path) = freq {
                chars.freq_path = path;
            }
            if let Some(path) = words {
                chars.words_path = path;
            }
            if let Some(lang) = cli.common.lang {
                chars.lang = lang;
            }
            if let Some(size) = cli.common.batch_size {
                chars.batch_size = size;
            }
            Source::Characters
        }
        Command::Lexicon { data, top_k } => {
            let lexicon = &mut config.lexicon;
            if let Some(path) = data {
                lexicon.data_path = path;
            }
            if let Some(k) = top_k {
                lexicon.top_k = k;
            }
            if let Some(lang) = cli.common.lang {
                lexicon.lang = lang;
            }
            if let Some(size) = cli.common.batch_size {
                lexicon.batch_size = size;
            }
            Source::Lexicon
        }
    };
    config.validate()?;

    let outcome = pipeline::run(
        &config,
        source,
        |key| std::env::var(key).ok(),
        |store| Ok(GraphDb::connect(store)?),
    )
    .context("graph construction failed")?;

    if let RunOutcome::Loaded(summary) = outcome {
        info!(
            "Done: {} lexeme records, {} derivation records, {} constraints created",
            summary.nodes.records, summary.relations.records, summary.constraints
        );
    }
    Ok(())
}
