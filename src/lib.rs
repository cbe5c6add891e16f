//! A library for exact similarity joins in metric spaces.
//!
//! Given one or two [`Dataset`]s and a radius `eps`, a range join reports every pair of points
//! whose distance is at most `eps`. Four join strategies are provided:
//!
//! - [`BruteForceJoin`]: exhaustive `O(n * m)` comparison, also the only k-NN join.
//! - [`SuperEgo`]: grid-sort plus divide-and-conquer with bucket based pruning and an optional
//!   dimension reordering heuristic.
//! - [`QuickJoin`]: recursive partitioning around randomly chosen pivots with boundary windows.
//! - [`OutlierJoin`]: a Super-EGO variant that only counts neighbours per point and stops once a
//!   point is known not to be an outlier.
//!
//! Discovered pairs are written to a [`ResultCollector`], either a flat [`PairList`] or a
//! per-point [`NeighborMap`].
//!
//! # Distance units
//!
//! The default distance, [`Metric::SquaredEuclidean`], does **not** take a square root. Radii
//! passed to a join using it must already be squared: two points at Euclidean distance `0.1`
//! are neighbours for `eps >= 0.01`.
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    rustdoc::broken_intra_doc_links
)]

type Scalar = f64;

/// Identifier of a point, unique within its dataset.
pub type PointId = usize;

/// Optional ground-truth class of a point. Never read by the join algorithms.
pub type Label = i32;

mod error;
pub use error::{JoinError, Result};

mod metric;
pub use metric::{Distance, Metric};

mod dataset;
pub use dataset::{Dataset, Point};

mod collector;
pub use collector::{NeighborMap, PairList, ResultCollector};

mod join;
pub use join::{KnnJoin, RangeJoin};

mod brute;
pub use brute::{BruteForceJoin, BruteForceJoinBuilder};

mod grid;
pub use grid::DimensionStats;

mod superego;
pub use superego::{SuperEgo, SuperEgoBuilder};

mod quickjoin;
pub use quickjoin::{QuickJoin, QuickJoinBuilder};

mod outlier;
pub use outlier::{OutlierJoin, OutlierJoinBuilder};

pub mod eval;

#[cfg(test)]
mod tests;
