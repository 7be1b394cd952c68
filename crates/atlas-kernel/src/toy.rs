//! Toric toy oracle.
//!
//! A small but honest model of the [`Algebra`] capabilities, used by the
//! tests and the CLI:
//!
//! - **Charts** are affine toric charts: named coordinates, a set of
//!   irreducible components (empty set = empty chart), a base field label
//!   and an optional parent chart name for ancestry.
//! - **Opens** are principal opens: the coordinates that are inverted plus
//!   the components the open meets. An open is dense iff it meets every
//!   component of its chart.
//! - **Maps** are monomial maps: row `k` holds the exponent vector of
//!   target coordinate `k`. Composition is an integer matrix product.
//! - **Maximal extension** of a monomial map inverts exactly the
//!   coordinates that appear with a negative exponent.
//! - **Transforms** are base field extensions. Chart morphisms are monomial
//!   maps as well; base change produces identity chart morphisms.
//!
//! ## Projective space
//!
//! [`projective_space`] and [`projective_glueing`] build the standard
//! charts of ℙⁿ, chart `i` carrying the coordinates `xk/xi` for `k ≠ i`.

use crate::algebra::Algebra;
use crate::error::AtlasError;
use crate::glueing::Glueing;
use crate::patch::{Patch, PatchId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const DEFAULT_COMPONENT: &str = "main";
const DEFAULT_FIELD: &str = "QQ";

fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}

fn default_components() -> BTreeSet<String> {
    BTreeSet::from([DEFAULT_COMPONENT.to_string()])
}

/// An affine toric chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToricChart {
    pub name: String,
    pub coordinates: Vec<String>,
    #[serde(default = "default_components")]
    pub components: BTreeSet<String>,
    #[serde(default = "default_field")]
    pub base_field: String,
    #[serde(default)]
    pub parent: Option<String>,
}

impl ToricChart {
    /// An irreducible chart over ℚ.
    pub fn affine<S: Into<String>>(
        name: impl Into<String>,
        coordinates: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            coordinates: coordinates.into_iter().map(Into::into).collect(),
            components: default_components(),
            base_field: default_field(),
            parent: None,
        }
    }

    /// A chart with several irreducible components.
    pub fn reducible<S: Into<String>, T: Into<String>>(
        name: impl Into<String>,
        coordinates: impl IntoIterator<Item = S>,
        components: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            components: components.into_iter().map(Into::into).collect(),
            ..Self::affine(name, coordinates)
        }
    }

    /// The empty scheme, presented with coordinates.
    pub fn empty<S: Into<String>>(
        name: impl Into<String>,
        coordinates: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            components: BTreeSet::new(),
            ..Self::affine(name, coordinates)
        }
    }

    /// Mark this chart as descending from the chart named `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn dim(&self) -> usize {
        self.coordinates.len()
    }
}

/// A principal open subset of a toric chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToricOpen {
    /// Components of the ambient chart.
    pub ambient: BTreeSet<String>,
    /// Components this open meets.
    pub components: BTreeSet<String>,
    /// Indices of inverted coordinates.
    pub inverted: BTreeSet<usize>,
}

impl ToricOpen {
    /// The whole chart.
    pub fn whole(chart: &ToricChart) -> Self {
        Self::inverting(chart, [])
    }

    /// Complement of the coordinate hyperplanes `coordinates`.
    pub fn inverting(chart: &ToricChart, coordinates: impl IntoIterator<Item = usize>) -> Self {
        Self {
            ambient: chart.components.clone(),
            components: chart.components.clone(),
            inverted: coordinates.into_iter().collect(),
        }
    }

    /// An open meeting only some components of its chart.
    pub fn on_components<S: Into<String>>(
        chart: &ToricChart,
        components: impl IntoIterator<Item = S>,
        coordinates: impl IntoIterator<Item = usize>,
    ) -> Self {
        let components = components
            .into_iter()
            .map(Into::into)
            .filter(|c| chart.components.contains(c))
            .collect();
        Self {
            ambient: chart.components.clone(),
            components,
            inverted: coordinates.into_iter().collect(),
        }
    }
}

/// A monomial map: target coordinate `k` is `Π_j x_j^exponents[k][j]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonomialMap {
    pub exponents: Vec<Vec<i64>>,
}

impl MonomialMap {
    pub fn new(exponents: Vec<Vec<i64>>) -> Self {
        Self { exponents }
    }

    pub fn identity(dim: usize) -> Self {
        let exponents = (0..dim)
            .map(|k| (0..dim).map(|j| i64::from(k == j)).collect())
            .collect();
        Self { exponents }
    }

    pub fn target_dim(&self) -> usize {
        self.exponents.len()
    }

    pub fn source_dim(&self) -> Option<usize> {
        self.exponents.first().map(Vec::len)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity(self.target_dim())
    }

    /// Row count and common row width. Ragged matrices are rejected.
    pub fn shape(&self) -> Result<(usize, usize), AtlasError> {
        let width = self.source_dim().unwrap_or(0);
        match self.exponents.iter().position(|row| row.len() != width) {
            Some(k) => Err(AtlasError::oracle(format!(
                "ragged monomial map: row {k} has {} exponents, row 0 has {width}",
                self.exponents[k].len(),
            ))),
            None => Ok((self.target_dim(), width)),
        }
    }

    /// `next ∘ self`.
    pub fn then(&self, next: &MonomialMap) -> Result<MonomialMap, AtlasError> {
        let (rows, width) = self.shape()?;
        let (next_rows, next_width) = next.shape()?;
        if next_rows > 0 && next_width != rows {
            return Err(AtlasError::oracle(format!(
                "cannot compose monomial maps: {rows} target coordinates feed {next_width} source coordinates",
            )));
        }
        let exponents = next
            .exponents
            .iter()
            .map(|row| {
                (0..width)
                    .map(|j| {
                        row.iter()
                            .zip(&self.exponents)
                            .map(|(e, inner)| e * inner[j])
                            .sum()
                    })
                    .collect()
            })
            .collect();
        Ok(MonomialMap { exponents })
    }

    /// Coordinates that must be inverted for the map to be defined.
    pub fn poles(&self) -> BTreeSet<usize> {
        self.exponents
            .iter()
            .flat_map(|row| row.iter().enumerate().filter(|(_, e)| **e < 0))
            .map(|(j, _)| j)
            .collect()
    }

    /// Evaluate at a point of the source torus.
    pub fn evaluate(&self, point: &[f64]) -> Vec<f64> {
        self.exponents
            .iter()
            .map(|row| {
                row.iter()
                    .zip(point)
                    .map(|(e, x)| {
                        i32::try_from(*e).map_or_else(|_| x.powf(*e as f64), |e| x.powi(e))
                    })
                    .product()
            })
            .collect()
    }
}

/// A Laurent monomial with a coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monomial {
    pub coefficient: f64,
    pub exponents: Vec<i64>,
}

impl Monomial {
    pub fn new(coefficient: f64, exponents: Vec<i64>) -> Self {
        Self {
            coefficient,
            exponents,
        }
    }
}

/// Base field extension, e.g. ℚ ↪ ℚ(i).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExtension {
    pub field: String,
}

impl FieldExtension {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// The toric oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toric;

impl Algebra for Toric {
    type Chart = ToricChart;
    type Open = ToricOpen;
    type Map = MonomialMap;
    type Element = Monomial;
    type ChartMorphism = MonomialMap;
    type Transform = FieldExtension;

    fn name(&self) -> &str {
        "toric"
    }

    fn is_empty(&self, chart: &ToricChart) -> bool {
        chart.components.is_empty()
    }

    fn coordinates(&self, chart: &ToricChart) -> Vec<String> {
        chart.coordinates.clone()
    }

    fn is_dense(&self, open: &ToricOpen) -> bool {
        !open.components.is_empty() && open.components == open.ambient
    }

    fn intersect(&self, a: &ToricOpen, b: &ToricOpen) -> ToricOpen {
        ToricOpen {
            ambient: a.ambient.clone(),
            components: a.components.intersection(&b.components).cloned().collect(),
            inverted: a.inverted.union(&b.inverted).copied().collect(),
        }
    }

    fn compose(
        &self,
        first: &Glueing<Self>,
        second: &Glueing<Self>,
    ) -> Result<Glueing<Self>, AtlasError> {
        if first.second() != second.first() {
            return Err(AtlasError::malformed(format!(
                "glueings ({}, {}) and ({}, {}) do not share a middle chart",
                first.first(),
                first.second(),
                second.first(),
                second.second(),
            )));
        }
        let forward = first.maps().0.then(second.maps().0)?;
        let backward = second.maps().1.then(first.maps().1)?;

        let (source, _) = first.domains();
        let (_, target) = second.domains();
        let domain = ToricOpen {
            ambient: source.ambient.clone(),
            components: source.components.clone(),
            inverted: forward.poles(),
        };
        let codomain = ToricOpen {
            ambient: target.ambient.clone(),
            components: target.components.clone(),
            inverted: backward.poles(),
        };
        Ok(Glueing::new(
            first.first(),
            second.second(),
            (domain, codomain),
            (forward, backward),
        ))
    }

    fn apply_transform(
        &self,
        transform: &FieldExtension,
        chart: &ToricChart,
    ) -> Result<(ToricChart, MonomialMap), AtlasError> {
        let extended = ToricChart {
            base_field: transform.field.clone(),
            ..chart.clone()
        };
        Ok((extended, MonomialMap::identity(chart.dim())))
    }

    fn transform_glueing(
        &self,
        glueing: &Glueing<Self>,
        patches: (PatchId, PatchId),
        morphisms: (&MonomialMap, &MonomialMap),
    ) -> Result<Glueing<Self>, AtlasError> {
        if !morphisms.0.is_identity() || !morphisms.1.is_identity() {
            return Err(AtlasError::oracle(
                "toric base change only supports identity chart morphisms",
            ));
        }
        let (domain, codomain) = glueing.domains();
        let (forward, backward) = glueing.maps();
        Ok(Glueing::new(
            patches.0,
            patches.1,
            (domain.clone(), codomain.clone()),
            (forward.clone(), backward.clone()),
        ))
    }

    fn pullback(
        &self,
        morphism: &MonomialMap,
        element: &Monomial,
    ) -> Result<Monomial, AtlasError> {
        let (rows, width) = morphism.shape()?;
        if element.exponents.len() != rows {
            return Err(AtlasError::oracle(format!(
                "cannot pull back a monomial in {} coordinates along a map into {rows}",
                element.exponents.len(),
            )));
        }
        let exponents = (0..width)
            .map(|j| {
                element
                    .exponents
                    .iter()
                    .zip(&morphism.exponents)
                    .map(|(e, row)| e * row[j])
                    .sum()
            })
            .collect();
        Ok(Monomial {
            coefficient: element.coefficient,
            exponents,
        })
    }

    fn identity_morphism(&self, chart: &ToricChart) -> MonomialMap {
        MonomialMap::identity(chart.dim())
    }

    fn compose_morphisms(
        &self,
        first: &MonomialMap,
        second: &MonomialMap,
    ) -> Result<MonomialMap, AtlasError> {
        first.then(second)
    }

    fn ancestor(&self, patch: &Patch<ToricChart>, candidates: &[Patch<ToricChart>]) -> Option<usize> {
        candidates.iter().position(|candidate| {
            candidate == patch || patch.parent.as_deref() == Some(candidate.name.as_str())
        })
    }

    fn embedding(
        &self,
        patch: &Patch<ToricChart>,
        ancestor: &Patch<ToricChart>,
    ) -> Result<MonomialMap, AtlasError> {
        if patch.dim() != ancestor.dim() {
            return Err(AtlasError::oracle(format!(
                "{} ({} coordinates) does not embed into {} ({} coordinates)",
                patch.name,
                patch.dim(),
                ancestor.name,
                ancestor.dim(),
            )));
        }
        Ok(MonomialMap::identity(patch.dim()))
    }
}

/// The standard affine charts of ℙⁿ.
pub fn projective_space(n: usize) -> Vec<Patch<ToricChart>> {
    (0..=n)
        .map(|i| {
            let coordinates = (0..=n)
                .filter(|k| *k != i)
                .map(|k| format!("x{k}/x{i}"))
                .collect::<Vec<_>>();
            Patch::new(ToricChart::affine(format!("U{i}"), coordinates))
        })
        .collect()
}

/// The standard glueing of charts `i` and `j` of ℙⁿ along D(xj/xi) ≅ D(xi/xj).
///
/// # Panics
///
/// If `i` or `j` is not an index into `charts`.
pub fn projective_glueing(charts: &[Patch<ToricChart>], i: usize, j: usize) -> Glueing<Toric> {
    assert!(
        i < charts.len() && j < charts.len(),
        "charts ({i}, {j}) are not both among the {} charts of projective space",
        charts.len()
    );
    let n = charts.len() - 1;
    // Position of homogeneous index `k` among the coordinates of chart `c`.
    let position = |c: usize, k: usize| if k < c { k } else { k - 1 };
    let transition = |from: usize, to: usize| {
        let rows = (0..=n)
            .filter(|k| *k != to)
            .map(|k| {
                let mut row = vec![0; n];
                if k == from {
                    row[position(from, to)] = -1;
                } else {
                    row[position(from, k)] += 1;
                    row[position(from, to)] -= 1;
                }
                row
            })
            .collect();
        MonomialMap::new(rows)
    };
    Glueing::new(
        charts[i].id(),
        charts[j].id(),
        (
            ToricOpen::inverting(&charts[i], [position(i, j)]),
            ToricOpen::inverting(&charts[j], [position(j, i)]),
        ),
        (transition(i, j), transition(j, i)),
    )
}
