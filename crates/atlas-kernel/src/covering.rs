//! Coverings by affine charts.
//!
//! A covering of a scheme X is a family of affine charts {U_i} together
//! with glueings U_i ⊇ U_ij ≅ U_ji ⊆ U_j along their overlaps.
//!
//! A [`Covering`] owns:
//! - the ordered, duplicate-free chart list ([`ChartRegistry`]),
//! - the glueings keyed by chart pair ([`GlueingStore`]),
//! - a cached glueing graph with an explicit dirty flag,
//! - a transition graph memoized on first request,
//! - optional decomposition info (ring elements per chart).
//!
//! Absence of a glueing for a pair means "disjoint or not computed yet";
//! it is not the same as an identity glueing.

use crate::algebra::Algebra;
use crate::error::AtlasError;
use crate::glueing::{Glueing, GlueingStore};
use crate::graph::{
    GlueingGraph, PrunedGlueingGraph, TransitionGraph, build_glueing_graph,
    build_pruned_glueing_graph, build_transition_graph,
};
use crate::patch::{ChartRegistry, Patch, PatchId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_COVERING_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a covering. Two coverings are "the same" iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoveringId(pub u64);

impl fmt::Display for CoveringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "covering#{}", self.0)
    }
}

/// Construction-time settings of a covering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoveringOptions {
    /// Treat every glueing domain as dense when building the glueing graph.
    pub all_dense: bool,

    /// Verify that glueings only mention registered charts.
    pub check: bool,
}

impl Default for CoveringOptions {
    fn default() -> Self {
        Self {
            all_dense: false,
            check: true,
        }
    }
}

#[derive(Debug)]
pub(crate) struct CachedGraph {
    pub(crate) graph: GlueingGraph,
    pub(crate) all_dense: bool,
}

/// A scheme presented by affine charts and glueings.
pub struct Covering<A: Algebra> {
    pub(crate) id: CoveringId,
    pub(crate) options: CoveringOptions,
    pub(crate) registry: ChartRegistry<A::Chart>,
    pub(crate) store: GlueingStore<A>,
    pub(crate) glueing_graph: Option<CachedGraph>,
    pub(crate) graph_dirty: bool,
    pub(crate) transition_graph: Option<TransitionGraph>,
    pub(crate) decomposition_info: BTreeMap<PatchId, Vec<A::Element>>,
}

impl<A: Algebra> Covering<A> {
    /// A covering by the given charts with no glueings yet.
    pub fn new(patches: impl IntoIterator<Item = Patch<A::Chart>>) -> Self {
        Self {
            id: CoveringId(NEXT_COVERING_ID.fetch_add(1, Ordering::Relaxed)),
            options: CoveringOptions::default(),
            registry: ChartRegistry::from_patches(patches),
            store: GlueingStore::new(),
            glueing_graph: None,
            graph_dirty: true,
            transition_graph: None,
            decomposition_info: BTreeMap::new(),
        }
    }

    /// A covering with glueings and explicit options.
    pub fn with_glueings(
        patches: impl IntoIterator<Item = Patch<A::Chart>>,
        glueings: impl IntoIterator<Item = Glueing<A>>,
        options: CoveringOptions,
    ) -> Result<Self, AtlasError> {
        let mut covering = Self::new(patches);
        covering.options = options;
        for glueing in glueings {
            covering.add_glueing(glueing)?;
        }
        Ok(covering)
    }

    pub fn id(&self) -> CoveringId {
        self.id
    }

    pub fn options(&self) -> CoveringOptions {
        self.options
    }

    /// Whether `other` is this very covering.
    pub fn is_same(&self, other: &Self) -> bool {
        self.id == other.id
    }

    pub fn registry(&self) -> &ChartRegistry<A::Chart> {
        &self.registry
    }

    pub fn store(&self) -> &GlueingStore<A> {
        &self.store
    }

    pub fn patches(&self) -> &[Patch<A::Chart>] {
        self.registry.patches()
    }

    pub fn patch(&self, index: usize) -> Option<&Patch<A::Chart>> {
        self.registry.get(index)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn index_of(&self, patch: PatchId) -> Result<usize, AtlasError> {
        self.registry.index_of(patch)
    }

    pub fn contains(&self, patch: PatchId) -> bool {
        self.registry.contains(patch)
    }

    /// Append a chart. Returns its index; adding a new chart invalidates the
    /// cached glueing graph.
    pub fn add_patch(&mut self, patch: Patch<A::Chart>) -> usize {
        let (index, added) = self.registry.push(patch);
        if added {
            self.graph_dirty = true;
        }
        index
    }

    /// The glueing of `a` with `b`.
    pub fn glueing(&self, a: PatchId, b: PatchId) -> Result<&Glueing<A>, AtlasError> {
        self.store.get(a, b)
    }

    pub fn has_glueing(&self, a: PatchId, b: PatchId) -> bool {
        self.store.contains(a, b)
    }

    /// Explicitly registered glueings in key order.
    pub fn glueings(&self) -> impl Iterator<Item = &Glueing<A>> {
        self.store.explicit()
    }

    /// Register a glueing (and its inverse).
    ///
    /// Returns true when the chart pair was previously unknown. Replacing a
    /// glueing also marks the glueing graph dirty.
    pub fn add_glueing(&mut self, glueing: Glueing<A>) -> Result<bool, AtlasError> {
        if self.options.check {
            let (a, b) = glueing.patches();
            self.registry.index_of(a)?;
            self.registry.index_of(b)?;
        }
        let (a, b) = glueing.patches();
        let added = self.store.add(glueing);
        self.graph_dirty = true;
        tracing::debug!(covering = %self.id, first = %a, second = %b, added, "registered glueing");
        Ok(added)
    }

    /// Whether the next glueing graph request will rebuild.
    pub fn is_graph_dirty(&self) -> bool {
        self.graph_dirty || self.glueing_graph.is_none()
    }

    /// The glueing graph, using the covering's `all_dense` option.
    pub fn glueing_graph(&mut self, algebra: &A) -> Result<&GlueingGraph, AtlasError> {
        let all_dense = self.options.all_dense;
        self.glueing_graph_with(algebra, all_dense)
    }

    /// The glueing graph, rebuilt if dirty or built with another override.
    pub fn glueing_graph_with(
        &mut self,
        algebra: &A,
        all_dense: bool,
    ) -> Result<&GlueingGraph, AtlasError> {
        refreshed_graph(
            &mut self.glueing_graph,
            &mut self.graph_dirty,
            algebra,
            &self.registry,
            &self.store,
            all_dense,
        )
    }

    /// The glueing graph over non-empty charts. Never cached.
    pub fn pruned_glueing_graph(&self, algebra: &A) -> PrunedGlueingGraph {
        build_pruned_glueing_graph(algebra, &self.registry, &self.store)
    }

    /// The transition graph, computed once per covering.
    ///
    /// Later glueing registrations do not invalidate it.
    pub fn transition_graph(&mut self, algebra: &A) -> Result<&TransitionGraph, AtlasError> {
        let transitions = match self.transition_graph.take() {
            Some(transitions) => transitions,
            None => {
                let graph = refreshed_graph(
                    &mut self.glueing_graph,
                    &mut self.graph_dirty,
                    algebra,
                    &self.registry,
                    &self.store,
                    self.options.all_dense,
                )?;
                build_transition_graph(algebra, &self.registry, &self.store, graph)?
            }
        };
        Ok(&*self.transition_graph.insert(transitions))
    }

    /// Whether the glueing graph is connected.
    ///
    /// A covering without charts has no meaningful answer.
    pub fn is_connected(&mut self, algebra: &A) -> Result<bool, AtlasError> {
        if self.is_empty() {
            return Err(AtlasError::EmptyCoveringDegenerate);
        }
        Ok(self.glueing_graph(algebra)?.component_count() == 1)
    }

    /// Component counts of the glueing and transition graphs.
    pub fn connectivity(&mut self, algebra: &A) -> Result<ConnectivityReport, AtlasError> {
        let charts = self.len();
        let glueing_components = self.glueing_graph(algebra)?.component_count();
        let transitions = self.transition_graph(algebra)?;
        Ok(ConnectivityReport {
            charts,
            glueing_components,
            transition_vertices: transitions.vertex_count(),
            transition_components: transitions.component_count(),
        })
    }

    /// Attach decomposition info to one chart.
    pub fn set_decomposition_info(
        &mut self,
        patch: PatchId,
        elements: Vec<A::Element>,
    ) -> Result<(), AtlasError> {
        self.registry.index_of(patch)?;
        self.decomposition_info.insert(patch, elements);
        Ok(())
    }

    /// Decomposition info counts only when every chart carries some.
    pub fn has_decomposition_info(&self) -> bool {
        !self.is_empty()
            && self
                .registry
                .ids()
                .all(|id| self.decomposition_info.contains_key(&id))
    }

    pub fn decomposition_info(&self, patch: PatchId) -> Option<&[A::Element]> {
        self.decomposition_info.get(&patch).map(Vec::as_slice)
    }

    /// Explicit glueings as index pairs, in index order.
    pub fn glueing_pairs(&self) -> Result<Vec<(usize, usize)>, AtlasError> {
        let mut pairs = self
            .store
            .explicit()
            .map(|g| Ok((self.index_of(g.first())?, self.index_of(g.second())?)))
            .collect::<Result<Vec<_>, AtlasError>>()?;
        pairs.sort_unstable();
        Ok(pairs)
    }

    /// Deterministic fingerprint over chart order, coordinates and glueing
    /// pairs. Independent of process-local chart ids.
    pub fn fingerprint(&self, algebra: &A) -> Result<String, AtlasError> {
        let mut hasher = Sha256::new();
        for (k, patch) in self.patches().iter().enumerate() {
            hasher.update(b"chart:");
            hasher.update(k.to_string().as_bytes());
            hasher.update(b":");
            hasher.update(algebra.coordinates(patch.chart()).join(",").as_bytes());
            hasher.update(b"\n");
        }
        for (i, j) in self.glueing_pairs()? {
            hasher.update(format!("glueing:{i}:{j}\n").as_bytes());
        }
        let hash = hasher.finalize();
        Ok(format!("{hash:x}"))
    }

    /// Structured summary for diagnostics.
    pub fn report(&self, algebra: &A) -> Result<CoveringReport, AtlasError> {
        let charts = self
            .patches()
            .iter()
            .enumerate()
            .map(|(index, patch)| ChartSummary {
                index,
                patch: patch.id(),
                coordinates: algebra.coordinates(patch.chart()),
                empty: algebra.is_empty(patch.chart()),
            })
            .collect();
        Ok(CoveringReport {
            covering: self.id,
            oracle: algebra.name().to_string(),
            charts,
            glueings: self.glueing_pairs()?,
            decomposition_info: self.has_decomposition_info(),
            fingerprint: self.fingerprint(algebra)?,
        })
    }

    /// Human readable dump: charts with coordinates, then glueing pairs.
    /// Indices are 1-based.
    pub fn display<'a>(&'a self, algebra: &'a A) -> CoveringDisplay<'a, A> {
        CoveringDisplay {
            covering: self,
            algebra,
        }
    }
}

impl<A: Algebra> fmt::Debug for Covering<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Covering")
            .field("id", &self.id)
            .field("patches", &self.registry.ids().collect::<Vec<_>>())
            .field("glueings", &self.store.len())
            .finish_non_exhaustive()
    }
}

fn refreshed_graph<'a, A: Algebra>(
    cache: &'a mut Option<CachedGraph>,
    dirty: &mut bool,
    algebra: &A,
    registry: &ChartRegistry<A::Chart>,
    store: &GlueingStore<A>,
    all_dense: bool,
) -> Result<&'a GlueingGraph, AtlasError> {
    let cached = match cache.take() {
        Some(cached) if !*dirty && cached.all_dense == all_dense => cached,
        _ => CachedGraph {
            graph: build_glueing_graph(algebra, registry, store, all_dense)?,
            all_dense,
        },
    };
    *dirty = false;
    Ok(&cache.insert(cached).graph)
}

/// Component counts reported by [`Covering::connectivity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub charts: usize,
    pub glueing_components: usize,
    pub transition_vertices: usize,
    pub transition_components: usize,
}

/// One chart in a [`CoveringReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub index: usize,
    pub patch: PatchId,
    pub coordinates: Vec<String>,
    pub empty: bool,
}

/// Serializable dump of a covering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveringReport {
    pub covering: CoveringId,
    pub oracle: String,
    pub charts: Vec<ChartSummary>,
    pub glueings: Vec<(usize, usize)>,
    pub decomposition_info: bool,
    pub fingerprint: String,
}

/// See [`Covering::display`].
pub struct CoveringDisplay<'a, A: Algebra> {
    covering: &'a Covering<A>,
    algebra: &'a A,
}

impl<A: Algebra> fmt::Display for CoveringDisplay<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patches = self.covering.patches();
        if patches.is_empty() {
            return write!(f, "Empty covering");
        }
        let noun = if patches.len() == 1 { "chart" } else { "charts" };
        write!(f, "Covering with {} {noun}", patches.len())?;
        for (k, patch) in patches.iter().enumerate() {
            let coordinates = self.algebra.coordinates(patch.chart());
            write!(f, "\n  {}: [{}]", k + 1, coordinates.join(", "))?;
        }
        let pairs = self.covering.glueing_pairs().map_err(|_| fmt::Error)?;
        if !pairs.is_empty() {
            let pairs = pairs
                .iter()
                .map(|(i, j)| format!("({}, {})", i + 1, j + 1))
                .collect::<Vec<_>>();
            write!(f, "\n  glued along {}", pairs.join(", "))?;
        }
        Ok(())
    }
}
