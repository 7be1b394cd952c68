//! # Atlas Kernel
//!
//! Bookkeeping for schemes presented by affine charts: which charts exist,
//! how they are glued, which overlaps are dense, and which glueings follow
//! from others by composition.
//!
//! This crate is **algebra-agnostic**: it never computes with polynomials.
//! Density, intersection, composition with maximal extension, base change
//! and pullback come from an [`Algebra`] oracle supplied by the caller.
//!
//! ## Architecture
//!
//! ```text
//! Algebra               ← Oracle: density, intersect, compose, transform
//!     │
//! Patch / ChartRegistry ← Charts by identity, ordered, duplicate-free
//!     │
//! GlueingStore          ← (A, B) ↦ glueing, inverses derived lazily
//!     │
//! Covering              ← Charts + glueings + cached graphs
//!     │
//! GlueingGraph          ← Dense-domain adjacency between charts
//!     │
//! TransitionGraph       ← Composable pairs of glueings
//!     │
//! fill_transitions      ← Transitive closure to a fixed point
//! ```
//!
//! [`refinement`] and [`base_change`](mod@base_change) build covering
//! morphisms on top of this.

pub mod algebra;
pub mod base_change;
pub mod closure;
pub mod covering;
pub mod error;
pub mod glueing;
pub mod graph;
pub mod patch;
pub mod refinement;
pub mod toy;

pub use algebra::Algebra;
pub use base_change::base_change;
pub use covering::{
    ChartSummary, ConnectivityReport, Covering, CoveringDisplay, CoveringId, CoveringOptions,
    CoveringReport,
};
pub use error::AtlasError;
pub use glueing::{Glueing, GlueingStore};
pub use graph::{GlueingGraph, PrunedGlueingGraph, TransitionGraph};
pub use patch::{ChartRegistry, Patch, PatchId};
pub use refinement::{CommonRefinement, CoveringMorphism, common_refinement, is_refinement};
