//! Maps word-forms and lexemes to `Lexeme`/`Morph` payloads.
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::frequency::{FrequencyModel, characters, log_count};
use crate::db::models::{ComponentEdge, ComponentUnit, UnitKind, WordNode};
use crate::sources::lexicon::{Lexeme, Lexicon};

const EMPTY_OBJECT: &str = "{}";

/// How component unit identifiers are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    /// The unit text itself; only safe when the alphabet is language-specific.
    Text,
    /// `lang:text`, collision-free across languages.
    TextWithLanguage,
}

impl IdScheme {
    pub fn unit_id(&self, text: &str, lang: &str) -> String {
        match self {
            IdScheme::Text => text.to_string(),
            IdScheme::TextWithLanguage => format!("{lang}:{text}"),
        }
    }
}

/// Builds [`WordNode`] records from one source, in one decomposition mode.
pub struct RecordBuilder<'m> {
    model: &'m FrequencyModel,
    kind: UnitKind,
    lang: String,
    id_scheme: IdScheme,
    progress_every: usize,
}

impl<'m> RecordBuilder<'m> {
    pub fn new(model: &'m FrequencyModel, kind: UnitKind, lang: &str) -> Self {
        let id_scheme = match kind {
            UnitKind::Character => IdScheme::Text,
            UnitKind::Segment => IdScheme::TextWithLanguage,
        };
        Self {
            model,
            kind,
            lang: lang.to_string(),
            id_scheme,
            progress_every: 10_000,
        }
    }

    #[must_use]
    pub fn with_id_scheme(mut self, id_scheme: IdScheme) -> Self {
        self.id_scheme = id_scheme;
        self
    }

    #[must_use]
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every.max(1);
        self
    }

    /// One COMPONENT edge per unit, `order` being its position in `units`.
    pub fn components(&self, units: &[String]) -> Vec<ComponentEdge> {
        units
            .iter()
            .enumerate()
            .map(|(order, text)| {
                let count = self.model.unit(text);
                ComponentEdge {
                    unit: ComponentUnit {
                        id: self.id_scheme.unit_id(text, &self.lang),
                        text: text.clone(),
                        kind: self.kind,
                        lang: self.lang.clone(),
                        corpus_count: count,
                        corpus_log_count: log_count(count),
                    },
                    order,
                    edge_type: self.kind.component_type(),
                }
            })
            .collect()
    }

    /// Character mode: one node per distinct word-form, decomposed into its characters.
    pub fn build_words(&self, words: &[String]) -> Vec<WordNode> {
        let total = words.len();
        let started = Instant::now();
        info!("Preparing data for {total} words...");

        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(total);
        for (i, word) in words.iter().enumerate() {
            if seen.insert(word.as_str()) {
                let stat = self.model.word(word);
                nodes.push(WordNode {
                    id: word.clone(),
                    lemma: word.clone(),
                    pos: stat.pos,
                    lang: self.lang.clone(),
                    corpus_count: stat.freq,
                    corpus_log_count: log_count(stat.freq),
                    is_root: true,
                    features: EMPTY_OBJECT.to_string(),
                    misc: EMPTY_OBJECT.to_string(),
                    morphology: None,
                    corpus_stats: None,
                    components: self.components(&characters(word)),
                });
            } else {
                debug!("Skipping repeated word-form {word}");
            }
            self.report(i + 1, total, started);
        }
        nodes
    }

    /// Segment mode: one node per lexeme, decomposed into its morph segmentation.
    pub fn build_lexicon(&self, lexicon: &Lexicon) -> Vec<WordNode> {
        let total = lexicon.len();
        let started = Instant::now();
        info!("Iterating over lexicon to prepare {total} lexemes...");

        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(total);
        for (i, lexeme) in lexicon.iter().enumerate() {
            if seen.insert(lexeme.lemid.as_str()) {
                nodes.push(self.lexeme_node(lexicon, lexeme));
            } else {
                debug!("Skipping repeated lexeme id {}", lexeme.lemid);
            }
            self.report(i + 1, total, started);
        }
        nodes
    }

    fn lexeme_node(&self, lexicon: &Lexicon, lexeme: &Lexeme) -> WordNode {
        let stat = self.model.word(&lexeme.lemid);
        let corpus_stats = lexeme
            .corpus_stats()
            .map(Value::to_string)
            .unwrap_or_else(|| EMPTY_OBJECT.to_string());
        let morphology =
            Value::Array(lexeme.segmentation.iter().map(string_map).collect()).to_string();

        WordNode {
            id: lexeme.lemid.clone(),
            lemma: lexeme.lemma.clone(),
            pos: lexeme.pos.clone(),
            lang: self.lang.clone(),
            corpus_count: stat.freq,
            corpus_log_count: log_count(stat.freq),
            is_root: lexicon.parent_of(lexeme).is_none(),
            features: string_map(&lexeme.feats).to_string(),
            misc: lexeme.misc.to_string(),
            morphology: Some(morphology),
            corpus_stats: Some(corpus_stats),
            components: self.components(&lexeme.morphs()),
        }
    }

    fn report(&self, done: usize, total: usize, started: Instant) {
        if done % self.progress_every == 0 {
            info!(
                "Processed {done}/{total} words... ({:.2}s)",
                started.elapsed().as_secs_f64()
            );
        }
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ComponentType;
    use crate::pipeline::frequency::FrequencyTable;
    use crate::sources::frequency::FrequencyRow;
    use std::path::Path;

    fn scenario_model() -> (Vec<String>, FrequencyModel) {
        let words = vec!["ab".to_string(), "ac".to_string()];
        let table = FrequencyTable::from_rows(vec![
            FrequencyRow { word: "ab".into(), pos: "NOUN".into(), freq: 5.0 },
            FrequencyRow { word: "ac".into(), pos: "VERB".into(), freq: 3.0 },
        ]);
        let model = FrequencyModel::for_characters(&words, &table);
        (words, model)
    }

    #[test]
    fn test_character_word_node() {
        let (words, model) = scenario_model();
        let nodes = RecordBuilder::new(&model, UnitKind::Character, "zh").build_words(&words);
        assert_eq!(nodes.len(), 2);

        let ab = &nodes[0];
        assert_eq!(ab.id, "ab");
        assert_eq!(ab.pos, "NOUN");
        assert_eq!(ab.corpus_count, 5.0);
        assert_eq!(ab.corpus_log_count, 6f64.ln());
        assert_eq!(ab.features, "{}");

        let units: Vec<(usize, &str, f64)> = ab
            .components
            .iter()
            .map(|c| (c.order, c.unit.id.as_str(), c.unit.corpus_count))
            .collect();
        assert_eq!(units, vec![(0, "a", 8.0), (1, "b", 5.0)]);
        assert!(ab.components.iter().all(|c| c.edge_type == ComponentType::Compounding));
    }

    #[test]
    fn test_decomposition_round_trip() {
        let model = FrequencyModel::default();
        let builder = RecordBuilder::new(&model, UnitKind::Character, "zh");
        let word = "香港中文大学香".to_string();
        let mut edges = builder.build_words(std::slice::from_ref(&word)).remove(0).components;
        edges.reverse();
        edges.sort_by_key(|e| e.order);
        let rebuilt: String = edges.iter().map(|e| e.unit.text.as_str()).collect();
        assert_eq!(rebuilt, word);
    }

    #[test]
    fn test_zero_frequency_log_is_zero() {
        let model = FrequencyModel::default();
        let nodes = RecordBuilder::new(&model, UnitKind::Character, "zh")
            .build_words(&["x".to_string()]);
        assert_eq!(nodes[0].corpus_count, 0.0);
        assert_eq!(nodes[0].corpus_log_count, 0.0);
        assert_eq!(nodes[0].pos, "UNKNOWN");
    }

    #[test]
    fn test_segment_ids_carry_language() {
        let data = "0.0\tučit#V\tučit\tV\t\tMorph=uč|Morph=it\t\t\t\t{\"corpus_stats\": {\"absolute_count\": 10}}\n\
0.1\tučitel#N\tučitel\tN\tGender=M\tMorph=uč|Morph=it|Morph=el\t0.0\tType=Derivation&Sources=0.0\t\t{}\n";
        let lexicon = Lexicon::parse(data.as_bytes(), Path::new("t.tsv")).unwrap();
        let model = FrequencyModel::for_lexicon(&lexicon);
        let nodes = RecordBuilder::new(&model, UnitKind::Segment, "cs").build_lexicon(&lexicon);

        let root = &nodes[0];
        assert!(root.is_root);
        assert_eq!(root.corpus_count, 10.0);
        assert_eq!(root.components[0].unit.id, "cs:uč");
        assert_eq!(root.components[0].unit.corpus_count, 10.0);
        assert_eq!(root.components[0].edge_type, ComponentType::Composition);
        assert_eq!(root.corpus_stats.as_deref(), Some(r#"{"absolute_count":10}"#));

        let child = &nodes[1];
        assert!(!child.is_root);
        assert_eq!(child.features, r#"{"Gender":"M"}"#);
        assert_eq!(child.components.len(), 3);
        assert_eq!(child.corpus_stats.as_deref(), Some("{}"));
    }

    #[test]
    fn test_plain_text_scheme() {
        assert_eq!(IdScheme::Text.unit_id("好", "zh"), "好");
        assert_eq!(IdScheme::TextWithLanguage.unit_id("uč", "cs"), "cs:uč");
    }
}
