//! Traversal Engine - Bounded Ancestor/Descendant Expansion
//!
//! The engine resolves seed nodes from a predicate, then expands breadth-first
//! over the parent relation, one depth level at a time:
//!
//! - `Ancestors`: the parent ids of the whole frontier are fetched with one
//!   batched `find_by_id_in` read
//! - `Descendants`: all nodes whose parent is in the frontier are fetched with
//!   one batched `find_by_parent_in` read
//!
//! Large frontiers are split into shards of `TraversalConfig::shard_size` ids
//! that are read concurrently and merged in id order before the level is
//! absorbed, so the output never depends on store iteration order.
//!
//! # Cycles and shared nodes
//!
//! A node reached a second time is either shared (a common ancestor of two
//! seeds) or proof of a cycle. It is a cycle exactly when the parent chain of
//! the re-encountered edge closes inside the closure; that case aborts the
//! traversal with `CycleDetected`. Shared nodes stay recorded once at their
//! minimum depth.
//!
//! # Depth bound
//!
//! When `max_depth` is reached with a non-empty frontier, one extra probe read
//! decides between `truncated = true` (unseen nodes exist) and a cycle (the
//! probe lands back on the chain). Running out of depth is never an error.

use crate::db::NodeStore;
use crate::models::{
    ClosureEntry, ClosureSet, Direction, Node, NodePredicate, TraversalRequest, TraversalStats,
};
use crate::services::cancellation::{CancellationSignal, SignalState};
use crate::services::config::TraversalConfig;
use crate::services::error::TraversalError;
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// A node reached from a frontier node during one expansion step.
#[derive(Debug)]
struct Edge {
    node: Node,
    /// Frontier node that discovered `node`
    via: String,
}

/// Stateless traversal engine over an injected node store.
#[derive(Clone)]
pub struct TraversalEngine {
    store: Arc<dyn NodeStore>,
    config: TraversalConfig,
}

impl TraversalEngine {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, TraversalConfig::default())
    }

    pub fn with_config(store: Arc<dyn NodeStore>, config: TraversalConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Compute the closure set reachable from the nodes matching
    /// `request.predicate`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a missing or zero `max_depth` or an empty
    ///   predicate, before any store access
    /// - `NotFound` when no node matches the predicate
    /// - `CycleDetected` when the parent relation loops
    /// - `StoreUnavailable` when any store read fails
    /// - `Cancelled` / `DeadlineExceeded` when `signal` trips between levels
    pub async fn traverse(
        &self,
        request: &TraversalRequest,
        signal: &CancellationSignal,
    ) -> Result<ClosureSet, TraversalError> {
        let max_depth = validate_request(request)?;
        let signal = signal.or_timeout(self.config.default_timeout());
        let direction = request.direction;
        let mut stats = TraversalStats::default();

        check_signal(&signal, 0)?;
        let seeds = self.resolve_seeds(&request.predicate, &mut stats).await?;
        let mut expansion = Expansion::from_seeds(direction, seeds);

        let mut frontier = expansion.seeds.clone();
        let mut depth = 0;
        while !frontier.is_empty() && depth < max_depth {
            check_signal(&signal, depth)?;
            tracing::debug!(
                %direction,
                depth,
                frontier = frontier.len(),
                "Expanding traversal level"
            );

            let edges = self
                .expand(direction, &frontier, &expansion, &mut stats)
                .await?;
            frontier = expansion.absorb(edges, depth + 1)?;
            if !frontier.is_empty() {
                stats.levels_expanded += 1;
            }
            depth += 1;
        }

        let mut truncated = false;
        if !frontier.is_empty() {
            check_signal(&signal, depth)?;
            let edges = self
                .expand(direction, &frontier, &expansion, &mut stats)
                .await?;
            truncated = expansion.probe(&edges)?;
            if truncated {
                tracing::debug!(%direction, max_depth, "Traversal truncated at depth bound");
            }
        }

        let closure = expansion.finish(truncated, stats);
        tracing::info!(
            %direction,
            seeds = closure.seeds.len(),
            entries = closure.len(),
            truncated,
            store_reads = stats.store_reads,
            "Traversal complete"
        );
        Ok(closure)
    }

    async fn resolve_seeds(
        &self,
        predicate: &NodePredicate,
        stats: &mut TraversalStats,
    ) -> Result<Vec<Node>, TraversalError> {
        stats.store_reads += 1;
        let mut seeds = self
            .store
            .find_by_predicate(predicate)
            .await
            .map_err(TraversalError::store_unavailable)?;

        sort_and_dedup(&mut seeds);
        if seeds.is_empty() {
            return Err(TraversalError::not_found(predicate));
        }
        Ok(seeds)
    }

    /// Read the next level for `frontier` and pair every returned node with
    /// the frontier node that discovered it.
    async fn expand(
        &self,
        direction: Direction,
        frontier: &[String],
        expansion: &Expansion,
        stats: &mut TraversalStats,
    ) -> Result<Vec<Edge>, TraversalError> {
        match direction {
            Direction::Ancestors => {
                // parent id -> lowest frontier id pointing at it
                let mut wanted: BTreeMap<String, String> = BTreeMap::new();
                let mut sorted: Vec<&String> = frontier.iter().collect();
                sorted.sort();
                for id in sorted {
                    if let Some(parent_id) = expansion.node(id).and_then(|n| n.parent_id.as_ref()) {
                        wanted
                            .entry(parent_id.clone())
                            .or_insert_with(|| id.clone());
                    }
                }
                if wanted.is_empty() {
                    return Ok(Vec::new());
                }

                let ids: Vec<String> = wanted.keys().cloned().collect();
                let parents = self.read_sharded(direction, &ids, stats).await?;

                let mut edges = Vec::with_capacity(parents.len());
                for node in parents {
                    if let Some(via) = wanted.remove(&node.id) {
                        edges.push(Edge { node, via });
                    }
                }
                for (parent_id, child_id) in wanted {
                    tracing::warn!(
                        node_id = %child_id,
                        parent_id = %parent_id,
                        "Dangling parent reference, stopping this branch"
                    );
                }
                Ok(edges)
            }
            Direction::Descendants => {
                let in_frontier: HashSet<&str> = frontier.iter().map(String::as_str).collect();
                let children = self.read_sharded(direction, frontier, stats).await?;

                Ok(children
                    .into_iter()
                    .filter_map(|node| {
                        let via = node
                            .parent_id
                            .as_deref()
                            .filter(|parent| in_frontier.contains(parent))?
                            .to_string();
                        Some(Edge { node, via })
                    })
                    .collect())
            }
        }
    }

    /// One logical batched read, issued as concurrent shards.
    async fn read_sharded(
        &self,
        direction: Direction,
        ids: &[String],
        stats: &mut TraversalStats,
    ) -> Result<Vec<Node>, TraversalError> {
        let shard_size = self.config.shard_size.max(1);
        let shards: Vec<&[String]> = ids.chunks(shard_size).collect();
        stats.store_reads += shards.len();

        let reads = shards.into_iter().map(|shard| {
            let store = Arc::clone(&self.store);
            async move {
                match direction {
                    Direction::Ancestors => store.find_by_id_in(shard).await,
                    Direction::Descendants => store.find_by_parent_in(shard).await,
                }
            }
        });

        let results = try_join_all(reads)
            .await
            .map_err(TraversalError::store_unavailable)?;

        let mut nodes: Vec<Node> = results.into_iter().flatten().collect();
        sort_and_dedup(&mut nodes);
        Ok(nodes)
    }
}

fn validate_request(request: &TraversalRequest) -> Result<u32, TraversalError> {
    if request.predicate.is_empty() {
        return Err(TraversalError::invalid_argument(format!(
            "predicate selects nothing: {}",
            request.predicate
        )));
    }
    match request.max_depth {
        None => Err(TraversalError::invalid_argument("max_depth is required")),
        Some(0) => Err(TraversalError::invalid_argument(
            "max_depth must be greater than zero",
        )),
        Some(depth) => Ok(depth),
    }
}

fn check_signal(signal: &CancellationSignal, depth: u32) -> Result<(), TraversalError> {
    match signal.check() {
        None => Ok(()),
        Some(SignalState::Cancelled) => Err(TraversalError::Cancelled { depth }),
        Some(SignalState::DeadlineExceeded) => Err(TraversalError::DeadlineExceeded { depth }),
    }
}

fn sort_and_dedup(nodes: &mut Vec<Node>) {
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    nodes.dedup_by(|a, b| a.id == b.id);
}

/// Mutable state of a single traversal call.
struct Expansion {
    direction: Direction,
    seeds: Vec<String>,
    entries: Vec<ClosureEntry>,
    index: HashMap<String, usize>,
}

impl Expansion {
    fn from_seeds(direction: Direction, seeds: Vec<Node>) -> Self {
        let mut expansion = Self {
            direction,
            seeds: seeds.iter().map(|n| n.id.clone()).collect(),
            entries: Vec::new(),
            index: HashMap::new(),
        };
        for (seed_index, node) in seeds.into_iter().enumerate() {
            expansion.insert(ClosureEntry {
                node,
                depth: 0,
                via: None,
                seed_index,
            });
        }
        expansion
    }

    fn insert(&mut self, entry: ClosureEntry) {
        self.index.insert(entry.node.id.clone(), self.entries.len());
        self.entries.push(entry);
    }

    fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.entries[i].node)
    }

    /// Record unseen nodes at `depth`, then classify re-encountered ones.
    ///
    /// Returns the ids of the next frontier.
    fn absorb(&mut self, edges: Vec<Edge>, depth: u32) -> Result<Vec<String>, TraversalError> {
        let mut revisits = Vec::new();
        let mut fresh = Vec::new();

        for edge in edges {
            if self.index.contains_key(&edge.node.id) {
                revisits.push(edge);
                continue;
            }
            let seed_index = self
                .index
                .get(&edge.via)
                .map(|&i| self.entries[i].seed_index)
                .unwrap_or_default();
            fresh.push(edge.node.id.clone());
            self.insert(ClosureEntry {
                node: edge.node,
                depth,
                via: Some(edge.via),
                seed_index,
            });
        }

        // All of this level is recorded first, so a cycle closing within the
        // level is visible to the parent walk
        for edge in &revisits {
            self.check_revisit(edge)?;
        }
        Ok(fresh)
    }

    /// Classify the probe read past the depth bound. True when it found
    /// nodes outside the closure.
    fn probe(&self, edges: &[Edge]) -> Result<bool, TraversalError> {
        let mut unseen = false;
        for edge in edges {
            if self.index.contains_key(&edge.node.id) {
                self.check_revisit(edge)?;
            } else {
                unseen = true;
            }
        }
        Ok(unseen)
    }

    /// A re-encountered node is a cycle when the parent chain closes:
    /// for ancestors, the revisited parent leads back up to the discoverer;
    /// for descendants, the discoverer leads back up to the revisited child.
    fn check_revisit(&self, edge: &Edge) -> Result<(), TraversalError> {
        let revisited = edge.node.id.as_str();
        let cycle = match self.direction {
            Direction::Ancestors => self.parent_walk(revisited, &edge.via),
            Direction::Descendants => self.parent_walk(&edge.via, revisited).map(|mut chain| {
                chain.reverse();
                chain
            }),
        };

        match cycle {
            Some(mut chain) => {
                chain.push(revisited.to_string());
                tracing::warn!(
                    node_id = %revisited,
                    chain = %chain.join(" -> "),
                    "Cycle detected in parent relation"
                );
                Err(TraversalError::cycle_detected(revisited, chain))
            }
            None => {
                tracing::debug!(node_id = %revisited, via = %edge.via, "Shared node already recorded");
                Ok(())
            }
        }
    }

    /// Follow `parent_id` inside the closure from `from` until `to`.
    fn parent_walk(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut chain = vec![from.to_string()];
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut current = from;

        while current != to {
            let parent = self.node(current)?.parent_id.as_deref()?;
            if !self.index.contains_key(parent) || !visited.insert(parent) {
                return None;
            }
            chain.push(parent.to_string());
            current = parent;
        }
        Some(chain)
    }

    fn finish(self, truncated: bool, stats: TraversalStats) -> ClosureSet {
        let mut entries = self.entries;
        entries.sort_by(|a, b| {
            (a.depth, a.seed_index, &a.node.id).cmp(&(b.depth, b.seed_index, &b.node.id))
        });

        ClosureSet {
            direction: self.direction,
            seeds: self.seeds,
            entries,
            truncated,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node(id: &str, parent: Option<&str>) -> Node {
        Node::new_with_id(id, parent.map(str::to_string), json!({ "name": id }))
    }

    async fn engine_over(nodes: Vec<Node>) -> (TraversalEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_nodes(nodes).await.unwrap());
        (TraversalEngine::new(store.clone()), store)
    }

    /// root -> {a, b}; a -> {a1, a2}; b -> {b1}
    fn small_tree() -> Vec<Node> {
        vec![
            node("root", None),
            node("a", Some("root")),
            node("b", Some("root")),
            node("a1", Some("a")),
            node("a2", Some("a")),
            node("b1", Some("b")),
        ]
    }

    async fn run(
        engine: &TraversalEngine,
        request: TraversalRequest,
    ) -> Result<ClosureSet, TraversalError> {
        engine.traverse(&request, &CancellationSignal::new()).await
    }

    #[tokio::test]
    async fn test_ancestors_of_leaf() {
        let (engine, _) = engine_over(small_tree()).await;
        let closure = run(&engine, TraversalRequest::ancestors(NodePredicate::id("a2"), 5))
            .await
            .unwrap();

        assert_eq!(closure.ids(), vec!["a2", "a", "root"]);
        assert_eq!(closure.get("root").unwrap().depth, 2);
        assert_eq!(closure.get("a").unwrap().via.as_deref(), Some("a2"));
        assert!(!closure.truncated);
        assert_eq!(closure.stats.levels_expanded, 2);
    }

    #[tokio::test]
    async fn test_descendants_are_ordered_by_depth_then_id() {
        let (engine, _) = engine_over(small_tree()).await;
        let closure = run(&engine, TraversalRequest::descendants(NodePredicate::id("root"), 5))
            .await
            .unwrap();

        assert_eq!(closure.ids(), vec!["root", "a", "b", "a1", "a2", "b1"]);
        assert_eq!(closure.get("b1").unwrap().via.as_deref(), Some("b"));
        assert!(!closure.truncated);
    }

    #[tokio::test]
    async fn test_shared_ancestors_recorded_once() {
        // Two seeds sharing "a" and "root"
        let store = Arc::new(MemoryStore::new());
        for mut n in small_tree() {
            if n.id == "a1" || n.id == "a2" {
                n.attributes.insert("leaf".into(), json!(true));
            }
            store.insert_node(n).await.unwrap();
        }
        let engine = TraversalEngine::new(store);
        let closure = run(
            &engine,
            TraversalRequest::ancestors(NodePredicate::attribute("leaf", true), 5),
        )
        .await
        .unwrap();

        assert_eq!(closure.seeds, vec!["a1", "a2"]);
        assert_eq!(closure.ids(), vec!["a1", "a2", "a", "root"]);
        let shared = closure.get("a").unwrap();
        assert_eq!(shared.via.as_deref(), Some("a1"));
        assert_eq!(shared.seed_index, 0);
    }

    #[tokio::test]
    async fn test_two_node_cycle_is_detected() {
        let (engine, store) = engine_over(vec![node("a", None), node("b", Some("a"))]).await;
        assert!(store.set_parent("a", Some("b")).await);

        let err = run(&engine, TraversalRequest::ancestors(NodePredicate::id("a"), 10))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TraversalError::cycle_detected("a", vec!["a".into(), "b".into(), "a".into()])
        );

        let err = run(&engine, TraversalRequest::descendants(NodePredicate::id("a"), 10))
            .await
            .unwrap_err();
        assert!(matches!(err, TraversalError::CycleDetected { .. }));
    }

    #[tokio::test]
    async fn test_self_loop_is_a_cycle() {
        let (engine, store) = engine_over(vec![node("loop", None)]).await;
        store.set_parent("loop", Some("loop")).await;

        let err = run(&engine, TraversalRequest::ancestors(NodePredicate::id("loop"), 3))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TraversalError::cycle_detected("loop", vec!["loop".into(), "loop".into()])
        );
    }

    #[tokio::test]
    async fn test_cycle_split_across_seeds_is_detected() {
        // s1 -> p, s2 -> q, p <-> q
        let (engine, store) = engine_over(vec![
            node("p", None),
            node("q", Some("p")),
            node("s1", Some("p")),
            node("s2", Some("q")),
        ])
        .await;
        store.set_parent("p", Some("q")).await;
        for id in ["s1", "s2"] {
            let mut seed = store.get_node(id).await.unwrap();
            seed.attributes.insert("seed".into(), json!(true));
            store.insert_node(seed).await.unwrap();
        }

        let err = run(
            &engine,
            TraversalRequest::ancestors(NodePredicate::attribute("seed", true), 10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TraversalError::CycleDetected { .. }));
    }

    #[tokio::test]
    async fn test_cycle_beyond_bound_is_caught_by_probe() {
        let (engine, store) = engine_over(vec![node("a", None), node("b", Some("a"))]).await;
        store.set_parent("a", Some("b")).await;

        // depth 1 records b; the probe lands back on a
        let err = run(&engine, TraversalRequest::ancestors(NodePredicate::id("a"), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TraversalError::CycleDetected { .. }));
    }

    #[tokio::test]
    async fn test_truncation_flag() {
        let chain: Vec<Node> = (0..10)
            .map(|i| {
                let parent = (i > 0).then(|| format!("n{}", i - 1));
                Node::new_with_id(format!("n{}", i), parent, json!({}))
            })
            .collect();
        let (engine, _) = engine_over(chain).await;

        let closure = run(&engine, TraversalRequest::ancestors(NodePredicate::id("n9"), 3))
            .await
            .unwrap();
        assert_eq!(closure.ids(), vec!["n9", "n8", "n7", "n6"]);
        assert!(closure.truncated);

        let exact = run(&engine, TraversalRequest::ancestors(NodePredicate::id("n9"), 9))
            .await
            .unwrap();
        assert_eq!(exact.len(), 10);
        assert!(!exact.truncated);
    }

    #[tokio::test]
    async fn test_dangling_parent_terminates_cleanly() {
        let (engine, _) = engine_over(vec![
            node("orphan", Some("deleted")),
            node("child", Some("orphan")),
        ])
        .await;

        let closure = run(&engine, TraversalRequest::ancestors(NodePredicate::id("child"), 10))
            .await
            .unwrap();
        assert_eq!(closure.ids(), vec!["child", "orphan"]);
        assert!(!closure.truncated);
    }

    #[tokio::test]
    async fn test_invalid_arguments_skip_the_store() {
        let store = Arc::new(CountingStore::default());
        let engine = TraversalEngine::new(store.clone());

        let mut request = TraversalRequest::ancestors(NodePredicate::id("a"), 1);
        request.max_depth = None;
        assert!(matches!(
            run(&engine, request.clone()).await,
            Err(TraversalError::InvalidArgument(_))
        ));

        request.max_depth = Some(0);
        assert!(matches!(
            run(&engine, request).await,
            Err(TraversalError::InvalidArgument(_))
        ));

        let empty = TraversalRequest::ancestors(NodePredicate::all(vec![]), 3);
        assert!(matches!(
            run(&engine, empty).await,
            Err(TraversalError::InvalidArgument(_))
        ));

        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_match_is_not_found() {
        let (engine, _) = engine_over(small_tree()).await;
        let err = run(&engine, TraversalRequest::ancestors(NodePredicate::id("zeus"), 3))
            .await
            .unwrap_err();
        assert_eq!(err, TraversalError::not_found(NodePredicate::id("zeus")));
    }

    #[tokio::test]
    async fn test_store_failure_is_store_unavailable() {
        let engine = TraversalEngine::new(Arc::new(FailingStore));
        let err = run(&engine, TraversalRequest::ancestors(NodePredicate::id("a"), 3))
            .await
            .unwrap_err();
        assert!(matches!(err, TraversalError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_frontier_is_sharded() {
        let mut nodes = vec![node("root", None)];
        nodes.extend((0..7).map(|i| node(&format!("c{}", i), Some("root"))));
        nodes.extend((0..7).map(|i| node(&format!("g{}", i), Some(&format!("c{}", i)))));
        let store = Arc::new(MemoryStore::with_nodes(nodes).await.unwrap());
        let config = TraversalConfig {
            shard_size: 3,
            ..TraversalConfig::default()
        };
        let sharded = TraversalEngine::with_config(store.clone(), config);
        let single = TraversalEngine::new(store);

        let request = TraversalRequest::descendants(NodePredicate::id("root"), 4);
        let a = run(&sharded, request.clone()).await.unwrap();
        let b = run(&single, request).await.unwrap();

        assert_eq!(a.entries, b.entries);
        // seed + [root] + 3 shards of c* + 3 shards of g*
        assert_eq!(a.stats.store_reads, 8);
        assert_eq!(b.stats.store_reads, 4);
    }

    #[tokio::test]
    async fn test_cancelled_signal_stops_traversal() {
        let (engine, _) = engine_over(small_tree()).await;
        let signal = CancellationSignal::new();
        signal.cancel();

        let err = engine
            .traverse(
                &TraversalRequest::descendants(NodePredicate::id("root"), 5),
                &signal,
            )
            .await
            .unwrap_err();
        assert_eq!(err, TraversalError::Cancelled { depth: 0 });
    }

    #[tokio::test]
    async fn test_expired_deadline_stops_traversal() {
        let (engine, _) = engine_over(small_tree()).await;
        let signal = CancellationSignal::with_deadline(tokio::time::Instant::now());

        let err = engine
            .traverse(
                &TraversalRequest::descendants(NodePredicate::id("root"), 5),
                &signal,
            )
            .await
            .unwrap_err();
        assert_eq!(err, TraversalError::DeadlineExceeded { depth: 0 });
    }

    /// n0 <- n1 <- ... <- n{len-1}
    fn chain(len: usize) -> Vec<Node> {
        (0..len)
            .map(|i| {
                let parent = (i > 0).then(|| format!("n{}", i - 1));
                Node::new_with_id(format!("n{}", i), parent, json!({}))
            })
            .collect()
    }

    async fn cancel_on_parent_read(
        read: usize,
        max_depth: u32,
    ) -> (Result<ClosureSet, TraversalError>, usize) {
        let signal = CancellationSignal::new();
        let store = Arc::new(CancellingStore {
            inner: MemoryStore::with_nodes(chain(10)).await.unwrap(),
            signal: signal.clone(),
            cancel_on: read,
            parent_reads: AtomicUsize::new(0),
        });
        let engine = TraversalEngine::new(store.clone());

        let result = engine
            .traverse(
                &TraversalRequest::ancestors(NodePredicate::id("n9"), max_depth),
                &signal,
            )
            .await;
        (result, store.parent_reads.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_cancel_between_levels_reports_depth() {
        let (result, reads) = cancel_on_parent_read(2, 5).await;

        assert_eq!(result.unwrap_err(), TraversalError::Cancelled { depth: 2 });
        assert_eq!(reads, 2);
    }

    #[tokio::test]
    async fn test_cancel_before_bound_read_skips_it() {
        // Three level reads fill max_depth 3; the bound read would be the fourth
        let (result, reads) = cancel_on_parent_read(3, 3).await;

        assert_eq!(result.unwrap_err(), TraversalError::Cancelled { depth: 3 });
        assert_eq!(reads, 3);
    }

    #[tokio::test]
    async fn test_uncancelled_chain_reads_every_level() {
        let (result, reads) = cancel_on_parent_read(usize::MAX, 3).await;

        let closure = result.unwrap();
        assert!(closure.truncated);
        assert_eq!(reads, 4);
    }

    /// Trips `signal` while serving the `cancel_on`-th parent read.
    struct CancellingStore {
        inner: MemoryStore,
        signal: CancellationSignal,
        cancel_on: usize,
        parent_reads: AtomicUsize,
    }

    #[async_trait]
    impl NodeStore for CancellingStore {
        async fn find_by_predicate(&self, predicate: &NodePredicate) -> anyhow::Result<Vec<Node>> {
            self.inner.find_by_predicate(predicate).await
        }

        async fn find_by_parent_in(&self, parent_ids: &[String]) -> anyhow::Result<Vec<Node>> {
            self.inner.find_by_parent_in(parent_ids).await
        }

        async fn find_by_id_in(&self, ids: &[String]) -> anyhow::Result<Vec<Node>> {
            let read = self.parent_reads.fetch_add(1, Ordering::SeqCst) + 1;
            if read == self.cancel_on {
                self.signal.cancel();
            }
            self.inner.find_by_id_in(ids).await
        }
    }

    #[derive(Default)]
    struct CountingStore {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl NodeStore for CountingStore {
        async fn find_by_predicate(&self, _: &NodePredicate) -> anyhow::Result<Vec<Node>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn find_by_parent_in(&self, _: &[String]) -> anyhow::Result<Vec<Node>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn find_by_id_in(&self, _: &[String]) -> anyhow::Result<Vec<Node>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl NodeStore for FailingStore {
        async fn find_by_predicate(&self, _: &NodePredicate) -> anyhow::Result<Vec<Node>> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn find_by_parent_in(&self, _: &[String]) -> anyhow::Result<Vec<Node>> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn find_by_id_in(&self, _: &[String]) -> anyhow::Result<Vec<Node>> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }
}
