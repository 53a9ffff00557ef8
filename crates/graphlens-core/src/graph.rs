//! Canonical graph model shared by ingestion and every analysis component.
//!
//! # Overview
//!
//! A [`CanonicalGraph`] owns an insertion-ordered node set and a list of
//! logical relationships (edges). Analysis treats the graph as undirected:
//! [`CanonicalGraph::adjacency`] lazily builds a petgraph `UnGraph` with one
//! edge per distinct unordered node pair, and the cached view is dropped on
//! every mutation.
//!
//! ## Parallel edges
//!
//! Inserting an edge between a pair that already carries an edge with the
//! same property set replaces that edge's weight (last write wins). An edge
//! whose property set differs from every existing edge on the pair is kept as
//! a separate logical relationship. The adjacency view still sees one edge
//! per pair; its weight is that of the most recent write.
//!
//! ## Node indices
//!
//! Node `i` in insertion order is `NodeIndex::new(i)` in the adjacency view,
//! so analysis code can move freely between ids, positions and petgraph
//! indices.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Open string-keyed attribute mapping carried by nodes and edges.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Default classification tag for nodes that carry none.
pub const DEFAULT_GROUP: i64 = 1;

/// Default edge weight.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Node keys the exchange format reads as fields, aliases included.
pub const NODE_RESERVED_KEYS: &[&str] = &["id", "label", "name", "group", "community"];

/// Edge keys the exchange format reads as fields, aliases included.
pub const EDGE_RESERVED_KEYS: &[&str] = &["source", "target", "from", "to", "weight", "value"];

/// Prefix given to a property whose key collides with a reserved key.
pub const ESCAPED_KEY_PREFIX: &str = "attr_";

/// Rename properties whose keys collide with `reserved` to
/// `attr_<key>` (repeating the prefix until the key is free), so a flattened
/// property can never shadow a field on write.
#[must_use]
pub fn escape_reserved(properties: Properties, reserved: &[&str]) -> Properties {
    let (clashing, mut out): (Properties, Properties) = properties
        .into_iter()
        .partition(|(k, _)| reserved.contains(&k.as_str()));
    for (key, value) in clashing {
        let mut escaped = format!("{ESCAPED_KEY_PREFIX}{key}");
        while out.contains_key(&escaped) {
            escaped.insert_str(0, ESCAPED_KEY_PREFIX);
        }
        out.insert(escaped, value);
    }
    out
}

/// A node in the canonical graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub group: i64,
    #[serde(flatten)]
    pub properties: Properties,
}

impl Node {
    /// A node whose label defaults to its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            group: DEFAULT_GROUP,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub const fn with_group(mut self, group: i64) -> Self {
        self.group = group;
        self
    }
}

/// A logical relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    #[serde(flatten)]
    pub properties: Properties,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: DEFAULT_WEIGHT,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Undirected view of a [`CanonicalGraph`] used by analysis.
///
/// Built once per graph on first use. Neighbor lists hold distinct
/// neighbors (self excluded) sorted by node position.
#[derive(Debug, Clone)]
pub struct Adjacency {
    /// One edge per distinct unordered pair, weight = latest write.
    pub graph: UnGraph<(), f64>,
    neighbors: Vec<Vec<usize>>,
    self_loops: Vec<bool>,
}

impl Adjacency {
    fn build(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut graph = UnGraph::<(), f64>::with_capacity(node_count, edges.len());
        for _ in 0..node_count {
            graph.add_node(());
        }

        let mut self_loops = vec![false; node_count];
        for &(a, b, w) in edges {
            let (ia, ib) = (NodeIndex::new(a), NodeIndex::new(b));
            if a == b {
                self_loops[a] = true;
            }
            if let Some(e) = graph.find_edge(ia, ib) {
                graph[e] = w;
            } else {
                graph.add_edge(ia, ib, w);
            }
        }

        let neighbors = (0..node_count)
            .map(|i| {
                let mut nbrs: Vec<usize> = graph
                    .neighbors(NodeIndex::new(i))
                    .map(NodeIndex::index)
                    .filter(|&j| j != i)
                    .collect();
                nbrs.sort_unstable();
                nbrs.dedup();
                nbrs
            })
            .collect();

        Self {
            graph,
            neighbors,
            self_loops,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of distinct undirected pairs (self-loops included).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Distinct neighbors of node `i`, excluding `i` itself.
    #[must_use]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    /// Degree of node `i`; a self-loop counts twice.
    #[must_use]
    pub fn degree(&self, i: usize) -> usize {
        self.neighbors[i].len() + if self.self_loops[i] { 2 } else { 0 }
    }

    #[must_use]
    pub fn has_self_loop(&self, i: usize) -> bool {
        self.self_loops[i]
    }

    #[must_use]
    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }

    #[must_use]
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .map(|e| self.graph[e])
    }

    /// Connected components as lists of node positions.
    ///
    /// Components are ordered by their first member's position and members
    /// are sorted, so output is deterministic.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.node_count();
        let mut seen = vec![false; n];
        let mut out = Vec::new();
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut members = vec![start];
            let mut cursor = 0;
            while cursor < members.len() {
                let v = members[cursor];
                cursor += 1;
                for &w in &self.neighbors[v] {
                    if !seen[w] {
                        seen[w] = true;
                        members.push(w);
                    }
                }
            }
            members.sort_unstable();
            out.push(members);
        }
        out
    }
}

/// The normalized in-memory graph all analysis operates on.
#[derive(Debug, Clone, Default)]
pub struct CanonicalGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// Unordered position pair -> indices into `edges`.
    pairs: HashMap<(usize, usize), Vec<usize>>,
    adjacency: OnceLock<Adjacency>,
}

impl CanonicalGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. A node with an existing id merges its properties into
    /// the stored node and keeps the stored label and group.
    ///
    /// Returns the node's position.
    pub fn add_node(&mut self, node: Node) -> usize {
        if let Some(&pos) = self.index.get(&node.id) {
            self.nodes[pos].properties.extend(node.properties);
            return pos;
        }
        let pos = self.nodes.len();
        self.index.insert(node.id.clone(), pos);
        self.nodes.push(node);
        self.adjacency = OnceLock::new();
        pos
    }

    /// Insert an edge between existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownEndpoint`] if either endpoint is not a node.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        let a = self.position_or_err(&edge.source)?;
        let b = self.position_or_err(&edge.target)?;
        let key = (a.min(b), a.max(b));

        let slots = self.pairs.entry(key).or_default();
        if let Some(&existing) = slots
            .iter()
            .find(|&&i| self.edges[i].properties == edge.properties)
        {
            self.edges[existing].weight = edge.weight;
        } else {
            slots.push(self.edges.len());
            self.edges.push(edge);
        }
        self.adjacency = OnceLock::new();
        Ok(())
    }

    fn position_or_err(&self, id: &str) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownEndpoint(id.to_string()))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of logical relationships (parallel edges with distinct
    /// property sets counted separately).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Id of the node at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of range.
    #[must_use]
    pub fn id_at(&self, pos: usize) -> &str {
        &self.nodes[pos].id
    }

    #[must_use]
    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(a), Some(b)) => self.pairs.contains_key(&(a.min(b), a.max(b))),
            _ => false,
        }
    }

    /// Undirected analysis view, built on first use.
    pub fn adjacency(&self) -> &Adjacency {
        self.adjacency.get_or_init(|| {
            let edges: Vec<(usize, usize, f64)> = self
                .edges
                .iter()
                .filter_map(|e| {
                    let a = self.index.get(&e.source)?;
                    let b = self.index.get(&e.target)?;
                    Some((*a, *b, e.weight))
                })
                .collect();
            Adjacency::build(self.nodes.len(), &edges)
        })
    }

    /// Distinct undirected edge pairs as `(smaller id, larger id)`.
    #[must_use]
    pub fn edge_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .keys()
            .map(|&(a, b)| {
                let (x, y) = (&self.nodes[a].id, &self.nodes[b].id);
                if x <= y {
                    (x.clone(), y.clone())
                } else {
                    (y.clone(), x.clone())
                }
            })
            .collect();
        pairs.sort();
        pairs
    }

    /// BLAKE3 digest of the sorted node ids and undirected edge pairs.
    ///
    /// Labels, groups, weights and properties do not contribute, so two
    /// ingestions of the same structure hash identically.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for id in ids {
            hasher.update(id.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(b"--\n");
        for (a, b) in self.edge_pairs() {
            hasher.update(a.as_bytes());
            hasher.update(b"\t");
            hasher.update(b.as_bytes());
            hasher.update(b"\n");
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }
}
