//! Importance-based pruning that keeps derivation edges referentially intact.
use std::collections::HashSet;

use tracing::info;

use super::GraphRecords;
use crate::db::models::{DerivationEdge, WordNode};

/// Keep the `keep` most frequent nodes, then drop every relation touching a
/// removed node.
///
/// Nodes are truncated first and relations filtered second; `is_root` is
/// left as built, so a child whose parent was pruned is not re-rooted.
pub fn prune(
    mut nodes: Vec<WordNode>,
    relations: Vec<DerivationEdge>,
    keep: usize,
) -> GraphRecords {
    info!("Filtering word nodes by corpus count. Total nodes: {}", nodes.len());
    nodes.sort_by(|a, b| b.corpus_count.total_cmp(&a.corpus_count));
    nodes.truncate(keep);

    let relations: Vec<DerivationEdge> = {
        let surviving: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        relations
            .into_iter()
            .filter(|r| {
                surviving.contains(r.parent_id.as_str()) && surviving.contains(r.child_id.as_str())
            })
            .collect()
    };

    info!("Kept top {keep}. Remaining nodes: {}", nodes.len());
    info!("Filtered relationships. Remaining: {}", relations.len());
    GraphRecords { nodes, relations }
}
