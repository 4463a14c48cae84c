//! Result Assembler
//!
//! Pure transformation from a closure set plus its per-seed paths into the
//! caller-facing [`TraversalResult`]. No store access happens here.

use crate::models::{
    ClosureEntry, ClosureSet, FlatEntry, SeedPaths, Shape, TraversalBody, TraversalResult,
    TreeNode,
};
use std::collections::{HashMap, HashSet};

/// Shape `closure` into a result.
pub fn assemble(closure: &ClosureSet, paths: Vec<SeedPaths>, shape: Shape) -> TraversalResult {
    let body = match shape {
        Shape::Flat => TraversalBody::Flat(flatten(closure)),
        Shape::Nested => TraversalBody::Nested(nest(closure)),
    };

    TraversalResult {
        direction: closure.direction,
        seeds: closure.seeds.clone(),
        truncated: closure.truncated,
        paths,
        body,
        stats: closure.stats,
    }
}

fn flatten(closure: &ClosureSet) -> Vec<FlatEntry> {
    let by_id: HashMap<&str, &ClosureEntry> = closure
        .entries
        .iter()
        .map(|entry| (entry.id(), entry))
        .collect();

    closure
        .entries
        .iter()
        .map(|entry| FlatEntry {
            node: entry.node.clone(),
            depth: entry.depth,
            path: discovery_chain(entry, &by_id),
        })
        .collect()
}

/// Seed -> entry, following `via` edges backwards.
fn discovery_chain(entry: &ClosureEntry, by_id: &HashMap<&str, &ClosureEntry>) -> Vec<String> {
    let mut chain = vec![entry.id().to_string()];
    let mut visited: HashSet<&str> = HashSet::from([entry.id()]);
    let mut current = entry;

    while let Some(via) = current.via.as_deref() {
        let Some(&previous) = by_id.get(via) else {
            break;
        };
        if !visited.insert(previous.id()) {
            break;
        }
        chain.push(via.to_string());
        current = previous;
    }

    chain.reverse();
    chain
}

fn nest(closure: &ClosureSet) -> Vec<TreeNode> {
    let members: HashSet<&str> = closure.entries.iter().map(ClosureEntry::id).collect();

    let mut children: HashMap<&str, Vec<&ClosureEntry>> = HashMap::new();
    let mut roots = Vec::new();
    for entry in &closure.entries {
        match entry.node.parent_id.as_deref() {
            Some(parent) if members.contains(parent) => {
                children.entry(parent).or_default().push(entry)
            }
            _ => roots.push(entry),
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.id().cmp(b.id()));
    }

    let mut placed = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| build_tree(root, &children, &mut placed))
        .collect()
}

fn build_tree<'a>(
    entry: &'a ClosureEntry,
    children: &HashMap<&str, Vec<&'a ClosureEntry>>,
    placed: &mut HashSet<&'a str>,
) -> Option<TreeNode> {
    if !placed.insert(entry.id()) {
        return None;
    }

    let kids = children
        .get(entry.id())
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| build_tree(*kid, children, placed))
                .collect()
        })
        .unwrap_or_default();

    Some(TreeNode {
        node: entry.node.clone(),
        depth: entry.depth,
        children: kids,
    })
}
