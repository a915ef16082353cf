//! # lexgraph — lexical property-graph builder
//!
//! Converts corpus frequency tables, character lists and segmented
//! derivational lexicons into a graph of words (`Lexeme`) and their
//! sub-word units (`Morph`), then loads it into a graph store with
//! idempotent, chunked upsert transactions.
//!
//! ## Architecture
//!
//! - **[`config`]** — JSON pipeline settings and environment store settings
//! - **[`sources`]** — Frequency table, word list and lexicon readers
//! - **[`pipeline`]** — Frequency model, record builder, relation extractor, pruner, batch loader
//! - **[`db`]** — SQLite-backed property graph store and write operations
//! - **[`error`]** — Error taxonomy

pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod sources;
