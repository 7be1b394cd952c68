//! Base change of coverings.
//!
//! Transport a covering along a ring map: every chart is base changed by the
//! oracle, every explicit glueing is transported along the resulting chart
//! morphisms, and decomposition info is pulled back when every chart
//! carries some. Derived inverses are not transported; the new covering
//! derives its own.

use crate::algebra::Algebra;
use crate::covering::Covering;
use crate::error::AtlasError;
use crate::patch::Patch;
use crate::refinement::CoveringMorphism;
use std::collections::BTreeMap;

/// Base change `covering` along `transform`.
///
/// Returns the new covering together with the covering morphism from it
/// back to `covering`. Chart order, glueing pairs and options are
/// preserved. A glueing naming a chart outside `covering` fails with
/// [`AtlasError::ChartNotFound`].
pub fn base_change<A: Algebra>(
    algebra: &A,
    transform: &A::Transform,
    covering: &Covering<A>,
) -> Result<(Covering<A>, CoveringMorphism<A>), AtlasError> {
    let old = covering.patches();
    let mut new = Vec::with_capacity(old.len());
    let mut morphisms = Vec::with_capacity(old.len());
    for patch in old {
        let (chart, morphism) = algebra.apply_transform(transform, patch.chart())?;
        new.push(Patch::new(chart));
        morphisms.push(morphism);
    }

    let mut changed = Covering::new(new.iter().cloned());
    changed.options = covering.options();

    let store = covering.store();
    for (i, j) in covering.glueing_pairs()? {
        let glueing = store.get(old[i].id(), old[j].id())?;
        let transported = algebra.transform_glueing(
            glueing,
            (new[i].id(), new[j].id()),
            (&morphisms[i], &morphisms[j]),
        )?;
        changed.add_glueing(transported)?;
    }

    if covering.has_decomposition_info() {
        for (k, patch) in old.iter().enumerate() {
            if let Some(elements) = covering.decomposition_info(patch.id()) {
                let pulled = elements
                    .iter()
                    .map(|element| algebra.pullback(&morphisms[k], element))
                    .collect::<Result<Vec<_>, _>>()?;
                changed.set_decomposition_info(new[k].id(), pulled)?;
            }
        }
    }

    let maps: BTreeMap<_, _> = new
        .iter()
        .zip(old)
        .zip(morphisms)
        .map(|((fresh, original), morphism)| (fresh.id(), (original.id(), morphism)))
        .collect();
    let morphism = CoveringMorphism::new(&changed, covering, maps, false)?;

    tracing::info!(
        from = %covering.id(),
        to = %changed.id(),
        oracle = algebra.name(),
        charts = changed.len(),
        glueings = changed.store().explicit().count(),
        "base changed covering"
    );
    Ok((changed, morphism))
}
