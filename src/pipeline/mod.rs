//! Corpus → graph pipeline.
//!
//! Frequency model → record builder → (relation extractor) → pruner →
//! batch loader. Everything runs on the calling thread; only the store
//! writes block.
pub mod builder;
pub mod frequency;
pub mod loader;
pub mod prune;
pub mod relations;

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::{Config, StoreConfig};
use crate::db::GraphStore;
use crate::db::models::{DerivationEdge, UnitKind, WordNode};
use crate::db::queries::{DERIVATION_UPSERT, LEXEME_UPSERT, NODE_CONSTRAINTS};
use crate::error::PipelineError;
use crate::sources::frequency::{FrequencyRow, read_frequency_table};
use crate::sources::lexicon::Lexicon;
use crate::sources::words::read_word_list;
use builder::{IdScheme, RecordBuilder};
use frequency::{FrequencyModel, FrequencyTable};
use loader::{BatchLoader, LoadReport};

/// The full write set of one run.
#[derive(Debug, Clone, Default)]
pub struct GraphRecords {
    pub nodes: Vec<WordNode>,
    pub relations: Vec<DerivationEdge>,
}

/// What was written in one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub constraints: usize,
    pub nodes: LoadReport,
    pub relations: LoadReport,
}

/// Which input feeds a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Frequency table plus word list, decomposed into characters.
    Characters,
    /// Segmented derivational lexicon.
    Lexicon,
}

impl Source {
    pub fn batch_size(&self, config: &Config) -> usize {
        match self {
            Source::Characters => config.chars.batch_size,
            Source::Lexicon => config.lexicon.batch_size,
        }
    }
}

/// How a run ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Loaded(RunSummary),
    /// A required input file was absent; the store was never contacted.
    MissingInput(PathBuf),
    /// The input produced no nodes; the store was never contacted.
    Empty,
}

/// Character source: every target word decomposed into its characters. No relations.
pub fn build_character_graph(
    words: &[String],
    rows: Vec<FrequencyRow>,
    lang: &str,
    id_scheme: IdScheme,
    progress_every: usize,
) -> GraphRecords {
    let table = FrequencyTable::from_rows(rows);
    info!("Calculating character frequencies...");
    let model = FrequencyModel::for_characters(words, &table);
    let nodes = RecordBuilder::new(&model, UnitKind::Character, lang)
        .with_id_scheme(id_scheme)
        .with_progress_every(progress_every)
        .build_words(words);
    GraphRecords {
        nodes,
        relations: Vec::new(),
    }
}

/// Lexicon source: segment decomposition plus derivation edges, pruned to the top `top_k`.
pub fn build_lexicon_graph(
    lexicon: &Lexicon,
    lang: &str,
    progress_every: usize,
    top_k: usize,
) -> GraphRecords {
    let model = FrequencyModel::for_lexicon(lexicon);
    let nodes = RecordBuilder::new(&model, UnitKind::Segment, lang)
        .with_progress_every(progress_every)
        .build_lexicon(lexicon);
    let relations = relations::extract_derivations(lexicon);
    prune::prune(nodes, relations, top_k)
}

/// Write `graph` to `store`: optional constraints, then nodes, then relations.
pub fn load_graph<S: GraphStore + ?Sized>(
    store: &mut S,
    graph: &GraphRecords,
    batch_size: usize,
    create_constraints: bool,
) -> Result<RunSummary, PipelineError> {
    let mut loader = BatchLoader::new(store, batch_size);
    let constraints = if create_constraints {
        loader.create_constraints(NODE_CONSTRAINTS)
    } else {
        0
    };
    let nodes = loader.load(&LEXEME_UPSERT, &graph.nodes)?;
    let relations = loader.load(&DERIVATION_UPSERT, &graph.relations)?;
    Ok(RunSummary {
        constraints,
        nodes,
        relations,
    })
}

/// Read the inputs of `source` and build its graph records.
pub fn prepare(config: &Config, source: Source) -> Result<GraphRecords, PipelineError> {
    match source {
        Source::Characters => {
            let chars = &config.chars;
            let rows = read_frequency_table(&chars.freq_path)?;
            let words = read_word_list(&chars.words_path)?;
            Ok(build_character_graph(
                &words,
                rows,
                &chars.lang,
                chars.id_scheme(),
                config.progress_every,
            ))
        }
        Source::Lexicon => {
            let lexicon = Lexicon::load(&config.lexicon.data_path)?;
            Ok(build_lexicon_graph(
                &lexicon,
                &config.lexicon.lang,
                config.progress_every,
                config.lexicon.top_k,
            ))
        }
    }
}

/// One full run: store settings, inputs, graph, then the store writes.
///
/// Store settings are resolved through `lookup` before any input is read.
/// The store is only opened (through `connect`) once there is something to
/// write, and it is dropped before returning on every path.
pub fn run<L, C, S>(
    config: &Config,
    source: Source,
    lookup: L,
    connect: C,
) -> Result<RunOutcome, PipelineError>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&StoreConfig) -> Result<S, PipelineError>,
    S: GraphStore,
{
    let store_config = StoreConfig::from_lookup(lookup)?;

    let graph = match prepare(config, source) {
        Ok(graph) => graph,
        Err(PipelineError::InputMissing(path)) => {
            error!("{} not found.", path.display());
            error!("Skipping graph construction due to missing data.");
            return Ok(RunOutcome::MissingInput(path));
        }
        Err(e) => return Err(e),
    };
    if graph.nodes.is_empty() {
        error!("Input yielded 0 nodes, nothing to load.");
        return Ok(RunOutcome::Empty);
    }

    let mut store = connect(&store_config)?;
    let summary = load_graph(
        &mut store,
        &graph,
        source.batch_size(config),
        config.create_constraints,
    )?;
    info!(
        "Graph construction complete: {} lexemes in {} batches, {} derivations in {} batches",
        summary.nodes.records,
        summary.nodes.batches,
        summary.relations.records,
        summary.relations.batches
    );
    Ok(RunOutcome::Loaded(summary))
}
