//! Glueings and the glueing store.
//!
//! A glueing of charts A and B identifies an open U ⊆ A with an open
//! V ⊆ B through a pair of mutually inverse maps f: U → V and g: V → U.
//!
//! The store keeps one explicit entry per registered glueing and a derived
//! entry for the opposite direction. The derived entry is the inverse
//! (V, U, g, f); it is materialized on first lookup and memoized in a
//! `OnceCell`, so the store is not `Sync`.

use crate::algebra::Algebra;
use crate::error::AtlasError;
use crate::patch::PatchId;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

/// An isomorphism between an open of one chart and an open of another.
pub struct Glueing<A: Algebra> {
    patches: (PatchId, PatchId),
    domains: (A::Open, A::Open),
    maps: (A::Map, A::Map),
}

impl<A: Algebra> Glueing<A> {
    /// `domains.0 ⊆ first`, `domains.1 ⊆ second`,
    /// `maps.0: domains.0 → domains.1`, `maps.1` its inverse.
    pub fn new(
        first: PatchId,
        second: PatchId,
        domains: (A::Open, A::Open),
        maps: (A::Map, A::Map),
    ) -> Self {
        Self {
            patches: (first, second),
            domains,
            maps,
        }
    }

    pub fn patches(&self) -> (PatchId, PatchId) {
        self.patches
    }

    pub fn first(&self) -> PatchId {
        self.patches.0
    }

    pub fn second(&self) -> PatchId {
        self.patches.1
    }

    pub fn domains(&self) -> (&A::Open, &A::Open) {
        (&self.domains.0, &self.domains.1)
    }

    pub fn maps(&self) -> (&A::Map, &A::Map) {
        (&self.maps.0, &self.maps.1)
    }

    /// The same identification read from the other side.
    pub fn inverse(&self) -> Self {
        Self {
            patches: (self.patches.1, self.patches.0),
            domains: (self.domains.1.clone(), self.domains.0.clone()),
            maps: (self.maps.1.clone(), self.maps.0.clone()),
        }
    }
}

impl<A: Algebra> Clone for Glueing<A> {
    fn clone(&self) -> Self {
        Self {
            patches: self.patches,
            domains: self.domains.clone(),
            maps: self.maps.clone(),
        }
    }
}

impl<A: Algebra> fmt::Debug for Glueing<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glueing")
            .field("patches", &self.patches)
            .field("domains", &self.domains)
            .field("maps", &self.maps)
            .finish()
    }
}

impl<A: Algebra> PartialEq for Glueing<A>
where
    A::Open: PartialEq,
    A::Map: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.patches == other.patches && self.domains == other.domains && self.maps == other.maps
    }
}

enum Entry<A: Algebra> {
    Explicit(Glueing<A>),
    Inverse(OnceCell<Glueing<A>>),
}

/// Glueings keyed by ordered chart pairs.
pub struct GlueingStore<A: Algebra> {
    entries: BTreeMap<(PatchId, PatchId), Entry<A>>,
}

impl<A: Algebra> Default for GlueingStore<A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<A: Algebra> GlueingStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a glueing under (A, B) and its lazy inverse under (B, A),
    /// replacing whatever was stored for either direction.
    ///
    /// Returns true if the pair was not known in either direction before.
    pub fn add(&mut self, glueing: Glueing<A>) -> bool {
        let (a, b) = glueing.patches();
        let is_new = !self.entries.contains_key(&(a, b)) && !self.entries.contains_key(&(b, a));
        if a != b {
            self.entries.insert((b, a), Entry::Inverse(OnceCell::new()));
        }
        self.entries.insert((a, b), Entry::Explicit(glueing));
        is_new
    }

    /// The glueing of `a` with `b`, inverting the registered (b, a) glueing
    /// on first use if needed.
    pub fn get(&self, a: PatchId, b: PatchId) -> Result<&Glueing<A>, AtlasError> {
        let not_found = || AtlasError::GlueingNotFound {
            first: a,
            second: b,
        };
        match self.entries.get(&(a, b)) {
            Some(Entry::Explicit(glueing)) => Ok(glueing),
            Some(Entry::Inverse(cell)) => {
                if let Some(glueing) = cell.get() {
                    return Ok(glueing);
                }
                let Some(Entry::Explicit(source)) = self.entries.get(&(b, a)) else {
                    return Err(not_found());
                };
                tracing::trace!(first = %a, second = %b, "materializing inverse glueing");
                Ok(cell.get_or_init(|| source.inverse()))
            }
            None => Err(not_found()),
        }
    }

    pub fn contains(&self, a: PatchId, b: PatchId) -> bool {
        self.entries.contains_key(&(a, b))
    }

    /// Whether (a, b) was registered explicitly rather than derived.
    pub fn is_explicit(&self, a: PatchId, b: PatchId) -> bool {
        matches!(self.entries.get(&(a, b)), Some(Entry::Explicit(_)))
    }

    /// Explicitly registered glueings in key order.
    pub fn explicit(&self) -> impl Iterator<Item = &Glueing<A>> {
        self.entries.values().filter_map(|entry| match entry {
            Entry::Explicit(glueing) => Some(glueing),
            Entry::Inverse(_) => None,
        })
    }

    /// All stored keys (explicit and derived) in order.
    pub fn pairs(&self) -> impl Iterator<Item = (PatchId, PatchId)> + '_ {
        self.entries.keys().copied()
    }

    /// Number of stored directions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
