//! Word and sub-word frequency statistics.
//!
//! All aggregation is a pure fold over the inputs; the resulting model is
//! immutable and complete before any record is built.
use std::collections::{HashMap, HashSet};

use crate::sources::frequency::FrequencyRow;
use crate::sources::lexicon::Lexicon;

/// Part-of-speech tag for word-forms absent from the frequency table.
pub const UNKNOWN_POS: &str = "UNKNOWN";

/// `ln(x + 1)`, so a zero count maps to zero.
pub fn log_count(x: f64) -> f64 {
    (x + 1.0).ln()
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordStat {
    pub pos: String,
    pub freq: f64,
}

impl WordStat {
    pub fn unknown() -> Self {
        Self {
            pos: UNKNOWN_POS.to_string(),
            freq: 0.0,
        }
    }
}

/// Frequency table keyed by word-form. When a form appears on several rows
/// the highest-frequency row wins.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    stats: HashMap<String, WordStat>,
}

impl FrequencyTable {
    pub fn from_rows(mut rows: Vec<FrequencyRow>) -> Self {
        rows.sort_by(|a, b| b.freq.total_cmp(&a.freq));
        let stats = rows.into_iter().fold(HashMap::new(), |mut acc, row| {
            acc.entry(row.word).or_insert(WordStat {
                pos: row.pos,
                freq: row.freq,
            });
            acc
        });
        Self { stats }
    }

    pub fn get(&self, word: &str) -> Option<&WordStat> {
        self.stats.get(word)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// The ordered characters of a word-form.
pub fn characters(form: &str) -> Vec<String> {
    form.chars().map(String::from).collect()
}

/// Sum each word's frequency into every distinct unit it contains.
///
/// A unit repeated inside one word is still counted once for that word.
pub fn aggregate_unit_frequency<I>(entries: I) -> HashMap<String, f64>
where
    I: IntoIterator<Item = (f64, Vec<String>)>,
{
    entries
        .into_iter()
        .fold(HashMap::new(), |mut acc, (freq, units)| {
            let unique: HashSet<String> = units.into_iter().collect();
            for unit in unique {
                *acc.entry(unit).or_insert(0.0) += freq;
            }
            acc
        })
}

/// Per-word statistics plus aggregated per-unit frequencies.
#[derive(Debug, Clone, Default)]
pub struct FrequencyModel {
    word_stats: HashMap<String, WordStat>,
    unit_freq: HashMap<String, f64>,
}

impl FrequencyModel {
    /// Character mode: word stats from `table`, units are the characters of each word.
    pub fn for_characters(words: &[String], table: &FrequencyTable) -> Self {
        let mut seen = HashSet::new();
        let word_stats: HashMap<String, WordStat> = words
            .iter()
            .filter(|&w| seen.insert(w.as_str()))
            .map(|w| {
                let stat = table.get(w).cloned().unwrap_or_else(WordStat::unknown);
                (w.clone(), stat)
            })
            .collect();

        let unit_freq = aggregate_unit_frequency(
            word_stats
                .iter()
                .map(|(word, stat)| (stat.freq, characters(word))),
        );

        Self {
            word_stats,
            unit_freq,
        }
    }

    /// Segment mode: word stats keyed by lemid, units are each lexeme's morph segments.
    pub fn for_lexicon(lexicon: &Lexicon) -> Self {
        let mut word_stats = HashMap::new();
        for lexeme in lexicon.iter() {
            word_stats
                .entry(lexeme.lemid.clone())
                .or_insert_with(|| WordStat {
                    pos: lexeme.pos.clone(),
                    freq: lexeme.absolute_count(),
                });
        }

        let mut seen = HashSet::new();
        let unit_freq = aggregate_unit_frequency(
            lexicon
                .iter()
                .filter(|&lex| seen.insert(lex.lemid.as_str()))
                .map(|lex| (lex.absolute_count(), lex.morphs())),
        );

        Self {
            word_stats,
            unit_freq,
        }
    }

    /// Stats for `word`, or `("UNKNOWN", 0)` when it is not known.
    pub fn word(&self, word: &str) -> WordStat {
        self.word_stats
            .get(word)
            .cloned()
            .unwrap_or_else(WordStat::unknown)
    }

    /// Aggregated frequency of `unit`, zero when it is not known.
    pub fn unit(&self, unit: &str) -> f64 {
        self.unit_freq.get(unit).copied().unwrap_or(0.0)
    }

    pub fn unit_freq(&self) -> &HashMap<String, f64> {
        &self.unit_freq
    }
}
