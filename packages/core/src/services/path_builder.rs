//! Path Builder
//!
//! Derives ordered id paths from a closure set, one [`SeedPaths`] per seed in
//! seed order:
//!
//! - `Ancestors`: a single seed -> root path, following `parent_id` while the
//!   parent is part of the closure
//! - `Descendants`: one seed -> leaf path per leaf, visiting children grouped
//!   by `parent_id` in `(depth, id)` order
//!
//! Walks only ever look at closure members and never revisit an id, so every
//! path is duplicate-free and bounded by the closure size even on bad data.

use crate::models::{ClosureEntry, ClosureSet, Direction, SeedPaths};
use std::collections::{HashMap, HashSet};

/// Build per-seed paths for `closure`.
pub fn build_paths(closure: &ClosureSet) -> Vec<SeedPaths> {
    let by_id: HashMap<&str, &ClosureEntry> = closure
        .entries
        .iter()
        .map(|entry| (entry.id(), entry))
        .collect();

    match closure.direction {
        Direction::Ancestors => closure
            .seeds
            .iter()
            .map(|seed| SeedPaths {
                seed_id: seed.clone(),
                paths: vec![ancestor_path(seed, &by_id)],
            })
            .collect(),
        Direction::Descendants => {
            let children = group_children(closure, &by_id);
            closure
                .seeds
                .iter()
                .map(|seed| SeedPaths {
                    seed_id: seed.clone(),
                    paths: descendant_paths(seed, &children),
                })
                .collect()
        }
    }
}

fn ancestor_path(seed: &str, by_id: &HashMap<&str, &ClosureEntry>) -> Vec<String> {
    let mut path = vec![seed.to_string()];
    let mut visited: HashSet<&str> = HashSet::from([seed]);
    let mut current = seed;

    while let Some(parent) = by_id
        .get(current)
        .and_then(|entry| entry.node.parent_id.as_deref())
    {
        if !by_id.contains_key(parent) || !visited.insert(parent) {
            break;
        }
        path.push(parent.to_string());
        current = parent;
    }
    path
}

/// parent id -> children in the closure, ordered by `(depth, id)`.
fn group_children<'a>(
    closure: &'a ClosureSet,
    by_id: &HashMap<&str, &'a ClosureEntry>,
) -> HashMap<&'a str, Vec<&'a ClosureEntry>> {
    let mut children: HashMap<&str, Vec<&ClosureEntry>> = HashMap::new();
    for entry in &closure.entries {
        if let Some(parent) = entry.node.parent_id.as_deref() {
            if by_id.contains_key(parent) {
                children.entry(parent).or_default().push(entry);
            }
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| (a.depth, a.id()).cmp(&(b.depth, b.id())));
    }
    children
}

fn descendant_paths(seed: &str, children: &HashMap<&str, Vec<&ClosureEntry>>) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    let mut visited: HashSet<&str> = HashSet::from([seed]);
    let mut path: Vec<&str> = Vec::new();
    // (node, length of the path above it)
    let mut stack: Vec<(&str, usize)> = vec![(seed, 0)];

    while let Some((id, above)) = stack.pop() {
        path.truncate(above);
        path.push(id);

        let next: Vec<&str> = children
            .get(id)
            .into_iter()
            .flatten()
            .map(|entry| entry.id())
            .filter(|child| visited.insert(*child))
            .collect();

        if next.is_empty() {
            paths.push(path.iter().map(|s| s.to_string()).collect());
            continue;
        }
        for child in next.into_iter().rev() {
            stack.push((child, above + 1));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, TraversalStats};
    use serde_json::json;

    fn entry(id: &str, parent: Option<&str>, depth: u32, via: Option<&str>) -> ClosureEntry {
        ClosureEntry {
            node: Node::new_with_id(id, parent.map(str::to_string), json!({})),
            depth,
            via: via.map(str::to_string),
            seed_index: 0,
        }
    }

    fn closure(direction: Direction, seeds: &[&str], entries: Vec<ClosureEntry>) -> ClosureSet {
        ClosureSet {
            direction,
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            entries,
            truncated: false,
            stats: TraversalStats::default(),
        }
    }

    #[test]
    fn test_ancestor_path_runs_seed_to_root() {
        let set = closure(
            Direction::Ancestors,
            &["thanatos"],
            vec![
                entry("thanatos", Some("nyx"), 0, None),
                entry("nyx", Some("chaos"), 1, Some("thanatos")),
                entry("chaos", None, 2, Some("nyx")),
            ],
        );

        let paths = build_paths(&set);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].seed_id, "thanatos");
        assert_eq!(paths[0].paths, vec![vec!["thanatos", "nyx", "chaos"]]);
    }

    #[test]
    fn test_ancestor_path_stops_at_closure_edge() {
        // "b" points outside the closure (truncated or dangling)
        let set = closure(
            Direction::Ancestors,
            &["a"],
            vec![entry("a", Some("b"), 0, None), entry("b", Some("c"), 1, Some("a"))],
        );
        assert_eq!(build_paths(&set)[0].paths, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_descendant_paths_one_per_leaf() {
        let set = closure(
            Direction::Descendants,
            &["root"],
            vec![
                entry("root", None, 0, None),
                entry("b", Some("root"), 1, Some("root")),
                entry("a", Some("root"), 1, Some("root")),
                entry("a2", Some("a"), 2, Some("a")),
                entry("a1", Some("a"), 2, Some("a")),
            ],
        );

        assert_eq!(
            build_paths(&set)[0].paths,
            vec![
                vec!["root", "a", "a1"],
                vec!["root", "a", "a2"],
                vec!["root", "b"],
            ]
        );
    }

    #[test]
    fn test_childless_seed_is_its_own_path() {
        let set = closure(Direction::Descendants, &["leaf"], vec![entry("leaf", Some("p"), 0, None)]);
        assert_eq!(build_paths(&set)[0].paths, vec![vec!["leaf"]]);
    }

    #[test]
    fn test_walks_survive_looping_parents() {
        let set = closure(
            Direction::Ancestors,
            &["a"],
            vec![entry("a", Some("b"), 0, None), entry("b", Some("a"), 1, Some("a"))],
        );
        assert_eq!(build_paths(&set)[0].paths, vec![vec!["a", "b"]]);

        let set = closure(
            Direction::Descendants,
            &["a"],
            vec![entry("a", Some("b"), 0, None), entry("b", Some("a"), 1, Some("a"))],
        );
        assert_eq!(build_paths(&set)[0].paths, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_paths_follow_seed_order() {
        let set = closure(
            Direction::Ancestors,
            &["x", "y"],
            vec![
                entry("x", Some("r"), 0, None),
                entry("y", Some("r"), 0, None),
                entry("r", None, 1, Some("x")),
            ],
        );

        let paths = build_paths(&set);
        assert_eq!(paths[0].paths, vec![vec!["x", "r"]]);
        assert_eq!(paths[1].seed_id, "y");
        assert_eq!(paths[1].paths, vec![vec!["y", "r"]]);
    }
}
