//! Reader for DeriNet-2 style derivational lexicons.
//!
//! Each non-blank line is one lexeme with tab-separated columns:
//! `ID LEMID LEMMA POS FEATS SEGMENTATION PARENT_ID PARENT_RELATION OTHER_RELATIONS MISC`.
//! Trees are separated by blank lines, which carry no meaning here.
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::frequency::parse_frequency;
use super::open_input;
use crate::error::PipelineError;

const MIN_COLUMNS: usize = 7;

/// The relation linking a lexeme to the lexeme(s) it was formed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRelation {
    pub relation_type: Option<String>,
    /// Node ids (first column) of the source lexemes.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub node_id: String,
    pub lemid: String,
    pub lemma: String,
    pub pos: String,
    pub feats: BTreeMap<String, String>,
    /// Segmentation entries in word order, each a `key=value` attribute map.
    pub segmentation: Vec<BTreeMap<String, String>>,
    pub parent_id: Option<String>,
    pub parent_relation: Option<ParentRelation>,
    pub misc: Value,
}

impl Lexeme {
    /// Segment texts in word order.
    pub fn morphs(&self) -> Vec<String> {
        self.segmentation
            .iter()
            .filter_map(|seg| seg.get("Morph").cloned())
            .collect()
    }

    /// The `corpus_stats` object from the misc data, if any.
    pub fn corpus_stats(&self) -> Option<&Value> {
        self.misc.get("corpus_stats")
    }

    /// Absolute corpus count, zero when missing or unparseable.
    pub fn absolute_count(&self) -> f64 {
        let raw = match self.corpus_stats().and_then(|s| s.get("absolute_count")) {
            Some(v) => v,
            None => return 0.0,
        };
        let parsed = match raw {
            Value::Number(n) => n
                .as_f64()
                .filter(|v| *v >= 0.0)
                .ok_or_else(|| PipelineError::Data(n.to_string())),
            Value::String(s) => parse_frequency(s),
            other => Err(PipelineError::Data(other.to_string())),
        };
        parsed.unwrap_or_else(|e| {
            debug!("{}: {e}, using 0", self.lemid);
            0.0
        })
    }
}

/// An in-memory lexicon indexed by node id.
#[derive(Debug, Default)]
pub struct Lexicon {
    lexemes: Vec<Lexeme>,
    by_node_id: HashMap<String, usize>,
}

impl Lexicon {
    /// Load a lexicon file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        info!("Loading lexicon from {}", path.display());
        let file = open_input(path)?;
        let lexicon = Self::parse(file, path)?;
        info!("Lexicon loaded: {} lexemes", lexicon.len());
        Ok(lexicon)
    }

    /// Parse a lexicon from any reader; `origin` is used in error messages.
    pub fn parse<R: Read>(reader: R, origin: &Path) -> Result<Self, PipelineError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut lexicon = Self::default();
        let mut skipped = 0usize;
        for (line, record) in rdr.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => match e.into_kind() {
                    csv::ErrorKind::Io(err) => return Err(PipelineError::from_io(origin, err)),
                    kind => {
                        debug!("Skipping lexicon line {}: {kind:?}", line + 1);
                        skipped += 1;
                        continue;
                    }
                },
            };
            if record.len() < MIN_COLUMNS {
                debug!("Skipping lexicon line {}: {} columns", line + 1, record.len());
                skipped += 1;
                continue;
            }

            let col = |i: usize| record.get(i).unwrap_or_default().trim();
            let lexeme = Lexeme {
                node_id: col(0).to_string(),
                lemid: col(1).to_string(),
                lemma: col(2).to_string(),
                pos: col(3).to_string(),
                feats: parse_attributes(col(4), '|'),
                segmentation: parse_segmentation(col(5)),
                parent_id: non_empty(col(6)),
                parent_relation: parse_parent_relation(col(7)),
                misc: parse_misc(col(9)),
            };
            if lexeme.node_id.is_empty() || lexeme.lemid.is_empty() {
                debug!("Skipping lexicon line {}: no identifier", line + 1);
                skipped += 1;
                continue;
            }
            lexicon.push(lexeme);
        }

        if skipped > 0 {
            info!("Skipped {skipped} malformed lexicon lines");
        }
        Ok(lexicon)
    }

    fn push(&mut self, lexeme: Lexeme) {
        self.by_node_id
            .insert(lexeme.node_id.clone(), self.lexemes.len());
        self.lexemes.push(lexeme);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lexeme> {
        self.lexemes.iter()
    }

    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }

    /// Looks up a lexeme by its node id.
    pub fn get(&self, node_id: &str) -> Option<&Lexeme> {
        self.by_node_id.get(node_id).map(|&i| &self.lexemes[i])
    }

    /// The primary derivational parent, if it is present in the lexicon.
    pub fn parent_of(&self, lexeme: &Lexeme) -> Option<&Lexeme> {
        lexeme.parent_id.as_deref().and_then(|id| self.get(id))
    }
}

fn non_empty(s: &str) -> Option<String> {
    match s {
        "" | "_" => None,
        s => Some(s.to_string()),
    }
}

fn parse_attributes(raw: &str, sep: char) -> BTreeMap<String, String> {
    raw.split(sep)
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

fn parse_segmentation(raw: &str) -> Vec<BTreeMap<String, String>> {
    raw.split('|')
        .map(|entry| parse_attributes(entry, '&'))
        .filter(|attrs| !attrs.is_empty())
        .collect()
}

fn parse_parent_relation(raw: &str) -> Option<ParentRelation> {
    let attrs = parse_attributes(raw, '&');
    if attrs.is_empty() {
        return None;
    }
    let sources = attrs
        .get("Sources")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(ParentRelation {
        relation_type: attrs.get("Type").cloned(),
        sources,
    })
}

fn parse_misc(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => v,
        _ => Value::Object(Map::new()),
    }
}
