//! Charts and the chart registry.
//!
//! A chart (patch) is one affine piece of a covering. The kernel never
//! inspects chart contents itself; it only needs to know whether two
//! handles refer to the *same* chart. Sameness is identity, not algebraic
//! equality: two isomorphic charts built separately are different patches.
//!
//! Identity is carried by a process-unique [`PatchId`] handed out when a
//! handle is created. Every map in the kernel is keyed by that id rather
//! than by pointer.

use crate::error::AtlasError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatchId(pub u64);

impl PatchId {
    fn fresh() -> Self {
        Self(NEXT_PATCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch#{}", self.0)
    }
}

/// A handle to a chart: identity plus shared access to the chart object.
///
/// Cloning a `Patch` keeps its identity. Calling [`Patch::new`] twice on
/// equal chart values gives two distinct patches.
pub struct Patch<C> {
    id: PatchId,
    chart: Arc<C>,
}

impl<C> Patch<C> {
    /// Wrap a chart object in a fresh handle.
    pub fn new(chart: C) -> Self {
        Self {
            id: PatchId::fresh(),
            chart: Arc::new(chart),
        }
    }

    pub fn id(&self) -> PatchId {
        self.id
    }

    pub fn chart(&self) -> &C {
        &self.chart
    }
}

impl<C> Clone for Patch<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            chart: Arc::clone(&self.chart),
        }
    }
}

impl<C> PartialEq for Patch<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C> Eq for Patch<C> {}

impl<C> std::hash::Hash for Patch<C> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<C: fmt::Debug> fmt::Debug for Patch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("id", &self.id)
            .field("chart", &self.chart)
            .finish()
    }
}

impl<C> std::ops::Deref for Patch<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.chart
    }
}

/// Ordered, duplicate-free list of charts with an index lookup.
#[derive(Debug)]
pub struct ChartRegistry<C> {
    patches: Vec<Patch<C>>,
    index: BTreeMap<PatchId, usize>,
}

impl<C> Default for ChartRegistry<C> {
    fn default() -> Self {
        Self {
            patches: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<C> ChartRegistry<C> {
    /// Build a registry, keeping the first occurrence of repeated handles.
    pub fn from_patches(patches: impl IntoIterator<Item = Patch<C>>) -> Self {
        let mut registry = Self::default();
        for patch in patches {
            registry.push(patch);
        }
        registry
    }

    /// Append a chart. Returns its index and whether it was new.
    pub fn push(&mut self, patch: Patch<C>) -> (usize, bool) {
        if let Some(&i) = self.index.get(&patch.id()) {
            return (i, false);
        }
        let i = self.patches.len();
        self.index.insert(patch.id(), i);
        self.patches.push(patch);
        (i, true)
    }

    /// Position of a chart in registration order.
    pub fn index_of(&self, patch: PatchId) -> Result<usize, AtlasError> {
        self.index
            .get(&patch)
            .copied()
            .ok_or(AtlasError::ChartNotFound { patch })
    }

    pub fn contains(&self, patch: PatchId) -> bool {
        self.index.contains_key(&patch)
    }

    pub fn patches(&self) -> &[Patch<C>] {
        &self.patches
    }

    pub fn get(&self, index: usize) -> Option<&Patch<C>> {
        self.patches.get(index)
    }

    /// Lookup a chart handle by id.
    pub fn patch(&self, patch: PatchId) -> Result<&Patch<C>, AtlasError> {
        let i = self.index_of(patch)?;
        Ok(&self.patches[i])
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PatchId> + '_ {
        self.patches.iter().map(Patch::id)
    }
}
