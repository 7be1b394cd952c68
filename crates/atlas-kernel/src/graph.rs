//! Glueing graph and transition graph.
//!
//! The glueing graph has one vertex per chart index. For a glueing of
//! charts i and j with domains (U, V), the arc i → j is present when U is
//! dense in chart i, and j → i when V is dense in chart j. The two
//! directions are tested and stored separately; traversal treats the graph
//! as undirected (i and j are neighbours if either arc exists).
//!
//! The transition graph has one vertex per oriented glueing-graph edge,
//! numbered in first-seen order. Vertices (i, v) and (v, j) are joined when
//! the two glueing domains inside chart v intersect densely, i.e. when the
//! glueings i ↔ v and v ↔ j can be composed safely.

use crate::algebra::Algebra;
use crate::error::AtlasError;
use crate::glueing::GlueingStore;
use crate::patch::{ChartRegistry, PatchId};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::graphmap::DiGraphMap;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};

/// Chart adjacency through dense glueing domains.
#[derive(Debug, Clone, Default)]
pub struct GlueingGraph {
    arcs: DiGraphMap<usize, ()>,
}

impl GlueingGraph {
    /// A graph on vertices `0..n` without arcs.
    pub fn with_vertices(n: usize) -> Self {
        let mut arcs = DiGraphMap::with_capacity(n, 0);
        for v in 0..n {
            arcs.add_node(v);
        }
        Self { arcs }
    }

    pub fn vertex_count(&self) -> usize {
        self.arcs.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.edge_count()
    }

    /// Number of adjacent vertex pairs.
    pub fn edge_count(&self) -> usize {
        self.arcs
            .all_edges()
            .map(|(i, j, _)| (i.min(j), i.max(j)))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Add the arc i → j. Returns false if it was already present.
    pub fn add_arc(&mut self, i: usize, j: usize) -> bool {
        self.arcs.add_edge(i, j, ()).is_none()
    }

    /// Add both arcs between i and j. Returns true if the two vertices were
    /// not adjacent before.
    pub fn add_edge(&mut self, i: usize, j: usize) -> bool {
        let was_adjacent = self.is_adjacent(i, j);
        self.add_arc(i, j);
        self.add_arc(j, i);
        !was_adjacent
    }

    pub fn has_arc(&self, i: usize, j: usize) -> bool {
        self.arcs.contains_edge(i, j)
    }

    pub fn is_adjacent(&self, i: usize, j: usize) -> bool {
        self.has_arc(i, j) || self.has_arc(j, i)
    }

    /// Neighbours of `v` in either direction, sorted.
    pub fn neighbors(&self, v: usize) -> Vec<usize> {
        if !self.arcs.contains_node(v) {
            return Vec::new();
        }
        self.arcs
            .neighbors_directed(v, Direction::Outgoing)
            .chain(self.arcs.neighbors_directed(v, Direction::Incoming))
            .filter(|n| *n != v)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Unordered pairs of distinct neighbours of `v`, each as (i, j), i < j.
    pub fn neighbor_pairs(&self, v: usize) -> Vec<(usize, usize)> {
        let neighbors = self.neighbors(v);
        let mut pairs = Vec::new();
        for (k, &i) in neighbors.iter().enumerate() {
            for &j in &neighbors[k + 1..] {
                pairs.push((i, j));
            }
        }
        pairs
    }

    /// All arcs, sorted.
    pub fn arcs(&self) -> Vec<(usize, usize)> {
        let mut arcs: Vec<_> = self.arcs.all_edges().map(|(i, j, _)| (i, j)).collect();
        arcs.sort_unstable();
        arcs
    }

    /// Number of connected components, ignoring arc direction.
    pub fn component_count(&self) -> usize {
        let n = self.vertex_count();
        let mut components = UnionFind::<usize>::new(n);
        for (i, j, _) in self.arcs.all_edges() {
            components.union(i, j);
        }
        (0..n)
            .map(|v| components.find(v))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// A glueing graph over the non-empty charts only.
#[derive(Debug, Clone, Default)]
pub struct PrunedGlueingGraph {
    pub graph: GlueingGraph,
    /// Surviving charts; vertex `k` of `graph` is `patches[k]`.
    pub patches: Vec<PatchId>,
}

/// Build the glueing graph from every explicit glueing in the store.
///
/// With `all_dense` set, every registered glueing contributes both arcs.
pub fn build_glueing_graph<A: Algebra>(
    algebra: &A,
    registry: &ChartRegistry<A::Chart>,
    store: &GlueingStore<A>,
    all_dense: bool,
) -> Result<GlueingGraph, AtlasError> {
    let mut graph = GlueingGraph::with_vertices(registry.len());
    for glueing in store.explicit() {
        let (a, b) = glueing.patches();
        if a == b {
            continue;
        }
        let i = registry.index_of(a)?;
        let j = registry.index_of(b)?;
        let (domain, codomain) = glueing.domains();
        if all_dense || algebra.is_dense(domain) {
            graph.add_arc(i, j);
        }
        if all_dense || algebra.is_dense(codomain) {
            graph.add_arc(j, i);
        }
    }
    tracing::debug!(
        oracle = algebra.name(),
        vertices = graph.vertex_count(),
        arcs = graph.arc_count(),
        all_dense,
        "built glueing graph"
    );
    Ok(graph)
}

/// Build the glueing graph after dropping empty charts.
///
/// Survivors are re-indexed contiguously in registry order. A covering whose
/// charts are all empty gives an empty graph.
pub fn build_pruned_glueing_graph<A: Algebra>(
    algebra: &A,
    registry: &ChartRegistry<A::Chart>,
    store: &GlueingStore<A>,
) -> PrunedGlueingGraph {
    let patches: Vec<PatchId> = registry
        .patches()
        .iter()
        .filter(|patch| !algebra.is_empty(patch.chart()))
        .map(|patch| patch.id())
        .collect();
    let position: BTreeMap<PatchId, usize> =
        patches.iter().enumerate().map(|(k, id)| (*id, k)).collect();

    let mut graph = GlueingGraph::with_vertices(patches.len());
    for glueing in store.explicit() {
        let (a, b) = glueing.patches();
        let (Some(&i), Some(&j)) = (position.get(&a), position.get(&b)) else {
            continue;
        };
        if i == j {
            continue;
        }
        let (domain, codomain) = glueing.domains();
        if algebra.is_dense(domain) {
            graph.add_arc(i, j);
        }
        if algebra.is_dense(codomain) {
            graph.add_arc(j, i);
        }
    }
    tracing::debug!(
        dropped = registry.len() - patches.len(),
        vertices = graph.vertex_count(),
        "built pruned glueing graph"
    );
    PrunedGlueingGraph { graph, patches }
}

/// Whether the glueings i ↔ v and v ↔ j meet densely inside chart v.
pub(crate) fn dense_through<A: Algebra>(
    algebra: &A,
    registry: &ChartRegistry<A::Chart>,
    store: &GlueingStore<A>,
    (i, v, j): (usize, usize, usize),
) -> Result<bool, AtlasError> {
    let id = |k: usize| {
        registry
            .get(k)
            .map(|patch| patch.id())
            .ok_or_else(|| AtlasError::malformed(format!("no chart at index {k}")))
    };
    let (pi, pv, pj) = (id(i)?, id(v)?, id(j)?);
    let into_v = store.get(pi, pv)?;
    let out_of_v = store.get(pv, pj)?;
    let overlap = algebra.intersect(into_v.domains().1, out_of_v.domains().0);
    let dense = algebra.is_dense(&overlap);
    tracing::trace!(i, v, j, dense, "checked overlap density");
    Ok(dense)
}

/// Compatibility of consecutive glueings.
#[derive(Debug, Clone, Default)]
pub struct TransitionGraph {
    graph: UnGraph<(usize, usize), ()>,
    ids: BTreeMap<(usize, usize), NodeIndex>,
}

impl TransitionGraph {
    fn vertex_for(&mut self, edge: (usize, usize)) -> NodeIndex {
        if let Some(&node) = self.ids.get(&edge) {
            return node;
        }
        let node = self.graph.add_node(edge);
        self.ids.insert(edge, node);
        node
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The id assigned to an oriented glueing-graph edge.
    pub fn id_of(&self, edge: (usize, usize)) -> Option<usize> {
        self.ids.get(&edge).map(|node| node.index())
    }

    /// The oriented glueing-graph edge behind an id.
    pub fn edge_of(&self, id: usize) -> Option<(usize, usize)> {
        self.graph.node_weight(NodeIndex::new(id)).copied()
    }

    /// The edge-to-id dictionary.
    pub fn edge_ids(&self) -> BTreeMap<(usize, usize), usize> {
        self.ids
            .iter()
            .map(|(edge, node)| (*edge, node.index()))
            .collect()
    }

    /// Edges as id pairs, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b))
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}

/// Build the transition graph over a glueing graph.
pub fn build_transition_graph<A: Algebra>(
    algebra: &A,
    registry: &ChartRegistry<A::Chart>,
    store: &GlueingStore<A>,
    glueing_graph: &GlueingGraph,
) -> Result<TransitionGraph, AtlasError> {
    let mut transitions = TransitionGraph::default();
    for v in 0..glueing_graph.vertex_count() {
        for (i, j) in glueing_graph.neighbor_pairs(v) {
            if !dense_through(algebra, registry, store, (i, v, j))? {
                continue;
            }
            let incoming = transitions.vertex_for((i, v));
            let outgoing = transitions.vertex_for((v, j));
            transitions.graph.update_edge(incoming, outgoing, ());
        }
    }
    tracing::debug!(
        vertices = transitions.vertex_count(),
        edges = transitions.edge_count(),
        "built transition graph"
    );
    Ok(transitions)
}
