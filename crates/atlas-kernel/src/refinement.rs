//! Covering morphisms and refinements.
//!
//! A covering D refines a covering C when every chart of D descends from
//! some chart of C. Ancestry is not something the kernel can decide: the
//! oracle says which chart a patch came from (principal open, sub-open,
//! ...) and how it embeds.
//!
//! Only the easy cases of common refinement are handled: identical
//! coverings, or one covering already refining the other. Anything else is
//! refused with [`AtlasError::UnsupportedRefinement`].

use crate::algebra::Algebra;
use crate::covering::{Covering, CoveringId};
use crate::error::AtlasError;
use crate::patch::PatchId;
use std::collections::BTreeMap;
use std::fmt;

/// A morphism of coverings: a chart morphism from every chart of the
/// domain into some chart of the codomain.
pub struct CoveringMorphism<A: Algebra> {
    domain: CoveringId,
    codomain: CoveringId,
    maps: BTreeMap<PatchId, (PatchId, A::ChartMorphism)>,
}

impl<A: Algebra> CoveringMorphism<A> {
    /// Assemble a morphism from per-chart data.
    ///
    /// With `check` set, every domain chart must be mapped and every target
    /// must be a chart of the codomain.
    pub fn new(
        domain: &Covering<A>,
        codomain: &Covering<A>,
        maps: BTreeMap<PatchId, (PatchId, A::ChartMorphism)>,
        check: bool,
    ) -> Result<Self, AtlasError> {
        if check {
            for patch in domain.registry().ids() {
                if !maps.contains_key(&patch) {
                    return Err(AtlasError::malformed(format!(
                        "covering morphism {} -> {} does not map {patch}",
                        domain.id(),
                        codomain.id()
                    )));
                }
            }
            for (source, (target, _)) in &maps {
                domain.index_of(*source)?;
                codomain.index_of(*target)?;
            }
        }
        Ok(Self {
            domain: domain.id(),
            codomain: codomain.id(),
            maps,
        })
    }

    /// The identity of a covering.
    pub fn identity(algebra: &A, covering: &Covering<A>) -> Self {
        let maps = covering
            .patches()
            .iter()
            .map(|patch| {
                (
                    patch.id(),
                    (patch.id(), algebra.identity_morphism(patch.chart())),
                )
            })
            .collect();
        Self {
            domain: covering.id(),
            codomain: covering.id(),
            maps,
        }
    }

    pub fn domain(&self) -> CoveringId {
        self.domain
    }

    pub fn codomain(&self) -> CoveringId {
        self.codomain
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Target chart and chart morphism for a domain chart.
    pub fn get(&self, patch: PatchId) -> Option<(PatchId, &A::ChartMorphism)> {
        self.maps
            .get(&patch)
            .map(|(target, morphism)| (*target, morphism))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatchId, PatchId, &A::ChartMorphism)> {
        self.maps
            .iter()
            .map(|(source, (target, morphism))| (*source, *target, morphism))
    }

    /// Whether this is an endomorphism sending every chart to itself.
    pub fn is_identity(&self) -> bool {
        self.domain == self.codomain && self.maps.iter().all(|(s, (t, _))| s == t)
    }

    /// `next ∘ self`.
    pub fn then(&self, algebra: &A, next: &CoveringMorphism<A>) -> Result<Self, AtlasError> {
        if self.codomain != next.domain {
            return Err(AtlasError::malformed(format!(
                "cannot compose {} -> {} with {} -> {}",
                self.domain, self.codomain, next.domain, next.codomain
            )));
        }
        let mut maps = BTreeMap::new();
        for (source, (middle, first)) in &self.maps {
            let (target, second) = next.maps.get(middle).ok_or_else(|| {
                AtlasError::malformed(format!("{middle} is not mapped by {}", next.domain))
            })?;
            maps.insert(
                *source,
                (*target, algebra.compose_morphisms(first, second)?),
            );
        }
        Ok(Self {
            domain: self.domain,
            codomain: next.codomain,
            maps,
        })
    }
}

impl<A: Algebra> fmt::Debug for CoveringMorphism<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoveringMorphism")
            .field("domain", &self.domain)
            .field("codomain", &self.codomain)
            .field("maps", &self.maps)
            .finish()
    }
}

/// Whether `fine` refines `coarse`; if so, the induced morphism.
///
/// Returns `None` as soon as one chart of `fine` has no ancestor among the
/// charts of `coarse`. The morphism has one entry per chart of `fine`.
pub fn is_refinement<A: Algebra>(
    algebra: &A,
    fine: &Covering<A>,
    coarse: &Covering<A>,
) -> Result<Option<CoveringMorphism<A>>, AtlasError> {
    let candidates = coarse.patches();
    let mut ancestors = Vec::with_capacity(fine.len());
    for patch in fine.patches() {
        match algebra.ancestor(patch, candidates) {
            Some(k) if k < candidates.len() => ancestors.push(k),
            _ => {
                tracing::debug!(
                    fine = %fine.id(),
                    coarse = %coarse.id(),
                    patch = %patch.id(),
                    "chart has no ancestor"
                );
                return Ok(None);
            }
        }
    }

    let mut maps = BTreeMap::new();
    for (patch, k) in fine.patches().iter().zip(ancestors) {
        let ancestor = &candidates[k];
        let embedding = algebra.embedding(patch, ancestor)?;
        maps.insert(patch.id(), (ancestor.id(), embedding));
    }
    CoveringMorphism::new(fine, coarse, maps, false).map(Some)
}

/// A covering refining two others, with the two refinement morphisms.
pub struct CommonRefinement<'a, A: Algebra> {
    pub refinement: &'a Covering<A>,
    pub to_first: CoveringMorphism<A>,
    pub to_second: CoveringMorphism<A>,
}

impl<A: Algebra> fmt::Debug for CommonRefinement<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonRefinement")
            .field("refinement", &self.refinement.id())
            .field("to_first", &self.to_first)
            .field("to_second", &self.to_second)
            .finish()
    }
}

/// A common refinement of `first` and `second`.
///
/// Handles identical coverings and coverings where one refines the other;
/// the general case fails with [`AtlasError::UnsupportedRefinement`].
pub fn common_refinement<'a, A: Algebra>(
    algebra: &A,
    first: &'a Covering<A>,
    second: &'a Covering<A>,
) -> Result<CommonRefinement<'a, A>, AtlasError> {
    if first.is_same(second) {
        return Ok(CommonRefinement {
            refinement: first,
            to_first: CoveringMorphism::identity(algebra, first),
            to_second: CoveringMorphism::identity(algebra, first),
        });
    }
    if let Some(to_second) = is_refinement(algebra, first, second)? {
        return Ok(CommonRefinement {
            refinement: first,
            to_first: CoveringMorphism::identity(algebra, first),
            to_second,
        });
    }
    if let Some(to_first) = is_refinement(algebra, second, first)? {
        return Ok(CommonRefinement {
            refinement: second,
            to_first,
            to_second: CoveringMorphism::identity(algebra, second),
        });
    }
    tracing::warn!(
        first = %first.id(),
        second = %second.id(),
        "neither covering refines the other"
    );
    Err(AtlasError::UnsupportedRefinement {
        first: first.id().to_string(),
        second: second.id().to_string(),
    })
}
