//! Record types shared by the graph builder and the store.
//!
//! The serde field names here are the payload contract consumed by the
//! write operations in [`super::queries`].
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a component unit is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Character,
    Segment,
}

impl UnitKind {
    /// Tag carried by the COMPONENT edges of this kind of unit.
    pub fn component_type(&self) -> ComponentType {
        match self {
            UnitKind::Character => ComponentType::Compounding,
            UnitKind::Segment => ComponentType::Composition,
        }
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(UnitKind::Character),
            "segment" => Ok(UnitKind::Segment),
            other => Err(format!("unknown unit kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Compounding,
    Composition,
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Compounding" => Ok(ComponentType::Compounding),
            "Composition" => Ok(ComponentType::Composition),
            other => Err(format!("unknown component type: {other}")),
        }
    }
}

/// A `Morph` node: one character or segment, shared by every word containing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentUnit {
    pub id: String,
    pub text: String,
    pub kind: UnitKind,
    pub lang: String,
    pub corpus_count: f64,
    pub corpus_log_count: f64,
}

/// A unit as it appears inside one word: the unit plus the COMPONENT edge properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEdge {
    #[serde(flatten)]
    pub unit: ComponentUnit,
    pub order: usize,
    pub edge_type: ComponentType,
}

/// A `Lexeme` node with its decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordNode {
    pub id: String,
    pub lemma: String,
    pub pos: String,
    pub lang: String,
    pub corpus_count: f64,
    pub corpus_log_count: f64,
    pub is_root: bool,
    /// JSON-encoded feature map, `"{}"` when absent.
    pub features: String,
    /// JSON-encoded miscellaneous data, `"{}"` when absent.
    pub misc: String,
    /// JSON-encoded segmentation, for lexicon sources only.
    pub morphology: Option<String>,
    /// JSON-encoded corpus statistics, for lexicon sources only.
    pub corpus_stats: Option<String>,
    pub components: Vec<ComponentEdge>,
}

/// A typed DERIVATION edge between two lexemes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivationEdge {
    pub child_id: String,
    pub parent_id: String,
    #[serde(rename = "type")]
    pub relation_type: String,
}

/// A lexeme as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLexeme {
    pub id: String,
    pub lemma: String,
    pub pos: String,
    pub lang: String,
    pub corpus_count: f64,
    pub corpus_log_count: f64,
    pub is_root: bool,
}

/// Node and edge totals in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphCounts {
    pub lexemes: usize,
    pub morphs: usize,
    pub components: usize,
    pub derivations: usize,
}
