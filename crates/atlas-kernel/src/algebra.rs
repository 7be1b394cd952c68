//! The algebraic oracle.
//!
//! The kernel orchestrates charts and glueings but never does algebra
//! itself. Everything that needs a computer-algebra kernel (density of an
//! open subset, intersections, composing and maximally extending maps,
//! base change of rings, pullbacks) goes through an [`Algebra`]
//! implementation supplied by the caller and assumed correct.
//!
//! [`crate::toy::Toric`] is a small monomial model used for tests and the
//! CLI.

use crate::error::AtlasError;
use crate::glueing::Glueing;
use crate::patch::{Patch, PatchId};
use std::fmt;

/// Capabilities the covering kernel consumes from the algebra layer.
pub trait Algebra: Sized {
    /// An affine chart.
    type Chart: fmt::Debug;

    /// Descriptor of an open subset of some chart.
    type Open: Clone + fmt::Debug;

    /// An isomorphism between two open subsets.
    type Map: Clone + fmt::Debug;

    /// A ring element on a chart (decomposition info).
    type Element: Clone + fmt::Debug;

    /// A morphism of charts, as produced by base change or ancestry.
    type ChartMorphism: Clone + fmt::Debug;

    /// A ring or field map to base change along.
    type Transform: ?Sized;

    /// Name of this oracle (for diagnostics).
    fn name(&self) -> &str;

    /// Whether the chart is the empty scheme.
    fn is_empty(&self, chart: &Self::Chart) -> bool;

    /// Coordinate labels, used only for printing.
    fn coordinates(&self, chart: &Self::Chart) -> Vec<String>;

    /// Whether the open subset is dense in its ambient chart.
    fn is_dense(&self, open: &Self::Open) -> bool;

    /// Intersection of two open subsets of the same chart.
    fn intersect(&self, a: &Self::Open, b: &Self::Open) -> Self::Open;

    /// Compose `first: X ↔ Y` with `second: Y ↔ Z` and extend the result
    /// maximally.
    ///
    /// The returned glueing must be registered for `(X, Z)`.
    fn compose(
        &self,
        first: &Glueing<Self>,
        second: &Glueing<Self>,
    ) -> Result<Glueing<Self>, AtlasError>;

    /// Base change one chart. The morphism goes from the new chart back to
    /// the original one.
    fn apply_transform(
        &self,
        transform: &Self::Transform,
        chart: &Self::Chart,
    ) -> Result<(Self::Chart, Self::ChartMorphism), AtlasError>;

    /// Base change one glueing along the chart morphisms of its two sides.
    fn transform_glueing(
        &self,
        glueing: &Glueing<Self>,
        patches: (PatchId, PatchId),
        morphisms: (&Self::ChartMorphism, &Self::ChartMorphism),
    ) -> Result<Glueing<Self>, AtlasError>;

    /// Pull a ring element back along a chart morphism.
    fn pullback(
        &self,
        morphism: &Self::ChartMorphism,
        element: &Self::Element,
    ) -> Result<Self::Element, AtlasError>;

    /// Identity morphism of a chart.
    fn identity_morphism(&self, chart: &Self::Chart) -> Self::ChartMorphism;

    /// `second ∘ first`, for `first: X → Y` and `second: Y → Z`.
    fn compose_morphisms(
        &self,
        first: &Self::ChartMorphism,
        second: &Self::ChartMorphism,
    ) -> Result<Self::ChartMorphism, AtlasError>;

    /// Index of the candidate chart `patch` descends from, if any.
    fn ancestor(&self, patch: &Patch<Self::Chart>, candidates: &[Patch<Self::Chart>])
    -> Option<usize>;

    /// The structural map from `patch` into its ancestor chart.
    fn embedding(
        &self,
        patch: &Patch<Self::Chart>,
        ancestor: &Patch<Self::Chart>,
    ) -> Result<Self::ChartMorphism, AtlasError>;
}
