//! Transitive closure of glueings.
//!
//! Given glueings X ↔ Y and Y ↔ Z whose domains inside Y intersect
//! densely, the composite X ↔ Z is determined: compose through Y and extend
//! the result to its maximal domain. [`Covering::fill_transitions`] keeps
//! doing this until a full pass over the glueing graph finds nothing new.
//!
//! Every registration adds one edge to the glueing graph, so there are at
//! most n(n-1)/2 registrations for n charts. Passes visit vertices in index
//! order and neighbour pairs in sorted order, which makes the result
//! reproducible for a fixed chart order.

use crate::algebra::Algebra;
use crate::covering::{CachedGraph, Covering};
use crate::error::AtlasError;
use crate::graph::{GlueingGraph, build_glueing_graph, dense_through};
use crate::patch::PatchId;

impl<A: Algebra> Covering<A> {
    /// Infer every glueing reachable through a dense chain of length two,
    /// to a fixed point.
    ///
    /// Returns the index pairs (i, j), i < j, of the glueings added, in the
    /// order they were registered. The cached glueing graph is updated in
    /// place and left clean.
    pub fn fill_transitions(&mut self, algebra: &A) -> Result<Vec<(usize, usize)>, AtlasError> {
        let mut cached = match self.glueing_graph.take() {
            Some(cached) if !self.graph_dirty && !cached.all_dense => cached,
            _ => CachedGraph {
                graph: build_glueing_graph(algebra, &self.registry, &self.store, false)?,
                all_dense: false,
            },
        };
        let result = self.close_over(algebra, &mut cached.graph);
        self.glueing_graph = Some(cached);
        self.graph_dirty = false;
        result
    }

    fn close_over(
        &mut self,
        algebra: &A,
        graph: &mut GlueingGraph,
    ) -> Result<Vec<(usize, usize)>, AtlasError> {
        let mut added = Vec::new();
        let mut passes = 0usize;
        loop {
            passes += 1;
            let mut changed = false;
            for v in 0..graph.vertex_count() {
                for (i, j) in graph.neighbor_pairs(v) {
                    if graph.is_adjacent(i, j) {
                        continue;
                    }
                    if !dense_through(algebra, &self.registry, &self.store, (i, v, j))? {
                        continue;
                    }
                    let (pi, pv, pj) = (self.patch_id(i)?, self.patch_id(v)?, self.patch_id(j)?);
                    let composite =
                        algebra.compose(self.store.get(pi, pv)?, self.store.get(pv, pj)?)?;
                    if composite.patches() != (pi, pj) {
                        return Err(AtlasError::malformed(format!(
                            "composite through {pv} was returned for ({}, {}), expected ({pi}, {pj})",
                            composite.first(),
                            composite.second(),
                        )));
                    }
                    self.store.add(composite);
                    graph.add_edge(i, j);
                    added.push((i, j));
                    changed = true;
                    tracing::debug!(covering = %self.id, i, v, j, "filled transition");
                }
            }
            if !changed {
                break;
            }
        }
        tracing::info!(
            covering = %self.id,
            added = added.len(),
            passes,
            "transitive closure reached a fixed point"
        );
        Ok(added)
    }

    fn patch_id(&self, index: usize) -> Result<PatchId, AtlasError> {
        self.registry
            .get(index)
            .map(|patch| patch.id())
            .ok_or_else(|| AtlasError::malformed(format!("no chart at index {index}")))
    }
}
