//! Derivation edges from lexicon parent/source links.
use tracing::{debug, info};

use crate::db::models::DerivationEdge;
use crate::sources::lexicon::{Lexeme, Lexicon};

/// Relation type used when the lexicon does not name one.
pub const DEFAULT_RELATION_TYPE: &str = "Derivation";

/// Emit one edge per (child, source) pair. Roots emit nothing.
///
/// Sources that cannot be resolved to a lexeme in `lexicon` are dropped.
pub fn extract_derivations(lexicon: &Lexicon) -> Vec<DerivationEdge> {
    let mut edges = Vec::new();
    for lexeme in lexicon.iter() {
        let (relation_type, sources) = parent_links(lexeme);
        for source in sources {
            match lexicon.get(source) {
                Some(parent) => edges.push(DerivationEdge {
                    child_id: lexeme.lemid.clone(),
                    parent_id: parent.lemid.clone(),
                    relation_type: relation_type.to_string(),
                }),
                None => debug!("{}: unknown source {source}", lexeme.lemid),
            }
        }
    }
    info!("Extracted {} derivation edges", edges.len());
    edges
}

/// The relation type and source node ids of a lexeme's parent relation.
///
/// Without an explicit relation, the primary parent is the single source.
fn parent_links(lexeme: &Lexeme) -> (&str, Vec<&str>) {
    match &lexeme.parent_relation {
        Some(rel) => {
            let relation_type = rel
                .relation_type
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_RELATION_TYPE);
            let mut sources: Vec<&str> = rel.sources.iter().map(String::as_str).collect();
            if sources.is_empty() {
                sources.extend(lexeme.parent_id.as_deref());
            }
            (relation_type, sources)
        }
        None => (
            DEFAULT_RELATION_TYPE,
            lexeme.parent_id.as_deref().into_iter().collect(),
        ),
    }
}
