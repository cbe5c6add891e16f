use crate::Scalar;
use ndarray::ArrayView1;

use ndarray_stats::DeviationExt;

/// Relative tolerance added to pruning bounds derived from [`Distance::to_metric`], so that
/// rounding never excludes a pair lying exactly on a bound. Widened bounds only cost extra
/// comparisons; matches are always decided in raw units.
pub(crate) const ROUNDING_SLACK: Scalar = 1e-9;

/// A dissimilarity function between two feature vectors of equal length.
///
/// Implementations must be symmetric and return zero for identical vectors.
pub trait Distance {
    /// Calculates the distance between two points.
    fn compute(&self, a: ArrayView1<'_, Scalar>, b: ArrayView1<'_, Scalar>) -> Scalar;

    /// Maps a value returned by [`Distance::compute`] (or a radius in the same units) into units
    /// where the triangle inequality holds and no single coordinate can differ by more than the
    /// value.
    ///
    /// The identity is correct for every Lp distance with `p >= 1`. The grid width of
    /// [`SuperEgo`](crate::SuperEgo) and the partition windows of [`QuickJoin`](crate::QuickJoin)
    /// are derived from it.
    fn to_metric(&self, raw: Scalar) -> Scalar {
        raw
    }
}

/// Enum for distance functions in a metric space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Sum of squared per-dimension differences, i.e. L-2 distance **without** the square root.
    /// Radii must be given in squared units.
    SquaredEuclidean,
    /// L-2 or Euclidean distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Euclidean_distance)
    Euclidean,
    /// L-1 or Manhattan distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Taxicab_geometry).
    Manhattan,
    /// L-inf or Chebyshev distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Chebyshev_distance)
    Chebyshev,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::SquaredEuclidean
    }
}

impl Distance for Metric {
    /// Vectors of different length are infinitely far apart.
    fn compute(&self, a: ArrayView1<'_, Scalar>, b: ArrayView1<'_, Scalar>) -> Scalar {
        let d = match self {
            Metric::SquaredEuclidean => a.sq_l2_dist(&b),
            Metric::Euclidean => a.l2_dist(&b),
            Metric::Manhattan => a.l1_dist(&b),
            Metric::Chebyshev => a.linf_dist(&b),
        };

        d.unwrap_or(Scalar::INFINITY)
    }

    fn to_metric(&self, raw: Scalar) -> Scalar {
        match self {
            Metric::SquaredEuclidean => raw.sqrt(),
            _ => raw,
        }
    }
}

impl<D: Distance + ?Sized> Distance for &D {
    fn compute(&self, a: ArrayView1<'_, Scalar>, b: ArrayView1<'_, Scalar>) -> Scalar {
        (**self).compute(a, b)
    }

    fn to_metric(&self, raw: Scalar) -> Scalar {
        (**self).to_metric(raw)
    }
}
