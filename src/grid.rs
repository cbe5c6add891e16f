//! Grid-sorted working copies and the recursive EGO join driver shared by
//! [`SuperEgo`](crate::SuperEgo) and [`OutlierJoin`](crate::OutlierJoin).

use std::collections::HashMap;
use std::ops::Range;

use ndarray::{Array2, Axis};
use rand::Rng;

use crate::metric::ROUNDING_SLACK;
use crate::{Dataset, Distance, JoinError, Result, Scalar};

/// Index of the grid cell holding ```v``` along one dimension.
#[inline(always)]
pub(crate) fn bucket(v: Scalar, width: Scalar) -> i64 {
    (v / width).floor() as i64
}

/// A working copy of a dataset sorted lexicographically by grid cell.
#[derive(Debug)]
pub(crate) struct Grid {
    pub(crate) data: Dataset,
    /// Cell index of every value, same shape and row order as ```data```.
    pub(crate) keys: Array2<i64>,
    /// Row of each sorted point in the dataset handed to the join.
    pub(crate) origin: Vec<usize>,
}

impl Grid {
    /// EGO-sort: orders ```data``` by the tuple of per-dimension cell indices.
    pub(crate) fn sort(data: Dataset, width: Scalar) -> Self {
        let keys = data.values().mapv(|v| bucket(v, width));
        let mut order: Vec<usize> = (0..data.num_rows()).collect();
        order.sort_by(|&x, &y| keys.row(x).iter().cmp(keys.row(y).iter()));

        Self {
            data: data.select_rows(&order),
            keys: keys.select(Axis(0), &order),
            origin: order,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.num_rows()
    }
}

/// Grid cell width for a radius: the largest per-coordinate difference of a matching pair.
///
/// The width is widened slightly so rounding in ```v / width``` cannot put a matching pair two
/// cells apart.
pub(crate) fn grid_width<D: Distance>(distance: &D, eps: Scalar) -> Result<Scalar> {
    let width = distance.to_metric(eps);
    if width.is_finite() && width > 0. {
        Ok(width * (1. + ROUNDING_SLACK))
    } else {
        Err(JoinError::InvalidArgument(format!(
            "radius {} maps to unusable grid width {}",
            eps, width
        )))
    }
}

pub(crate) fn check_sample_ratio(ratio: Option<Scalar>) -> Result<Scalar> {
    let ratio = ratio.unwrap_or(0.2);
    if ratio > 0. && ratio <= 1. {
        Ok(ratio)
    } else {
        Err(JoinError::InvalidArgument(format!(
            "sample ratio must be in (0, 1], got {}",
            ratio
        )))
    }
}

/// Clones the inputs, optionally reorders their dimensions and grid-sorts them.
///
/// Returns the grid of ```a```, the grid of ```b``` (```None``` for a self join, which shares
/// the first grid) and the reordering statistics when ```reorder``` carries a sample ratio.
pub(crate) fn working_grids<R: Rng>(
    a: &Dataset,
    b: Option<&Dataset>,
    width: Scalar,
    reorder: Option<(Scalar, &mut R)>,
) -> (Grid, Option<Grid>, Option<DimensionStats>) {
    let mut wa = a.clone();
    let mut wb = b.cloned();

    let stats = reorder.map(|(ratio, rng)| {
        let stats = DimensionStats::sample(&wa, wb.as_ref().unwrap_or(&wa), width, ratio, rng);
        wa.permute_columns(stats.order());
        if let Some(wb) = wb.as_mut() {
            wb.permute_columns(stats.order());
        }
        stats
    });

    let ga = Grid::sort(wa, width);
    let gb = wb.map(|data| Grid::sort(data, width));
    (ga, gb, stats)
}

/// Sampled per-dimension statistics used to reorder dimensions before EGO-sort.
#[derive(Clone, Debug, PartialEq)]
pub struct DimensionStats {
    order: Vec<usize>,
    mean_gap: Vec<Scalar>,
    fail_factor: Vec<Scalar>,
    sample_size: usize,
}

impl DimensionStats {
    /// Draws ```ceil(ratio * a.num_rows())``` random pairs from ```a``` x ```b``` and ranks the
    /// dimensions by descending mean absolute difference.
    pub(crate) fn sample<R: Rng>(
        a: &Dataset,
        b: &Dataset,
        width: Scalar,
        ratio: Scalar,
        rng: &mut R,
    ) -> Self {
        let ndim = a.num_cols();
        let sample_size = ((a.num_rows() as Scalar * ratio).ceil() as usize).max(1);

        let mut mean_gap = vec![0.; ndim];
        let mut hist_a: Vec<HashMap<i64, Scalar>> = vec![HashMap::new(); ndim];
        let mut hist_b: Vec<HashMap<i64, Scalar>> = vec![HashMap::new(); ndim];

        for _ in 0..sample_size {
            let pa = a.row(rng.gen_range(0..a.num_rows()));
            let pb = b.row(rng.gen_range(0..b.num_rows()));

            for d in 0..ndim {
                mean_gap[d] += (pa[d] - pb[d]).abs();
                *hist_a[d].entry(bucket(pa[d], width)).or_insert(0.) += 1.;
                *hist_b[d].entry(bucket(pb[d], width)).or_insert(0.) += 1.;
            }
        }

        // Fraction of sampled pairs that fall into the same or adjacent cells, i.e. that the
        // dimension alone would fail to prune.
        let norm = (sample_size * sample_size) as Scalar;
        let fail_factor: Vec<Scalar> = hist_a
            .iter()
            .zip(hist_b.iter())
            .map(|(ha, hb)| {
                let near = |cell: i64| {
                    (cell.saturating_sub(1)..=cell.saturating_add(1))
                        .filter_map(|c| hb.get(&c))
                        .sum::<Scalar>()
                };
                ha.iter().map(|(&cell, &n)| n * near(cell)).sum::<Scalar>() / norm
            })
            .collect();

        for gap in mean_gap.iter_mut() {
            *gap /= sample_size as Scalar;
        }

        let mut order: Vec<usize> = (0..ndim).collect();
        order.sort_by(|&x, &y| mean_gap[y].total_cmp(&mean_gap[x]));

        tracing::trace!(?order, ?mean_gap, ?fail_factor, sample_size, "dimension_stats");

        Self {
            order,
            mean_gap,
            fail_factor,
            sample_size,
        }
    }

    /// New dimension order: position ```j``` holds the original column index.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Mean absolute difference per original column over the sampled pairs.
    pub fn mean_gap(&self) -> &[Scalar] {
        &self.mean_gap
    }

    /// Estimated probability per original column that a sampled pair lands in the same or an
    /// adjacent grid cell.
    pub fn fail_factor(&self) -> &[Scalar] {
        &self.fail_factor
    }

    /// Number of sampled pairs.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

/// Action taken on a pair of row ranges that are too small to split further.
pub(crate) trait Leaf {
    fn visit(&mut self, a: &Grid, ra: Range<usize>, b: &Grid, rb: Range<usize>);
}

/// Counters reported by the recursive driver.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct EgoStats {
    pub(crate) leaves: usize,
    pub(crate) pruned: usize,
}

/// Recursive divide-and-conquer join over two grid-sorted copies.
///
/// With ```symmetric``` set, ```a``` and ```b``` must be the same grid. On diagonal blocks
/// (identical ranges) the (second half of A) x (first half of B) rectangle is then skipped, so
/// the leaf has to record both directions of each match.
pub(crate) struct EgoJoin<'g> {
    a: &'g Grid,
    b: &'g Grid,
    threshold: usize,
    symmetric: bool,
    pub(crate) stats: EgoStats,
}

impl<'g> EgoJoin<'g> {
    pub(crate) fn new(a: &'g Grid, b: &'g Grid, threshold: usize, symmetric: bool) -> Self {
        Self {
            a,
            b,
            // A range of one row cannot be split.
            threshold: threshold.max(2),
            symmetric,
            stats: EgoStats::default(),
        }
    }

    pub(crate) fn run<L: Leaf>(&mut self, leaf: &mut L) {
        if self.a.len() == 0 || self.b.len() == 0 {
            return;
        }

        self.recurse(0..self.a.len(), 0..self.b.len(), 0, leaf);
    }

    fn recurse<L: Leaf>(
        &mut self,
        ra: Range<usize>,
        rb: Range<usize>,
        start_dim: usize,
        leaf: &mut L,
    ) {
        let start_dim = match self.prune(&ra, &rb, start_dim) {
            Some(dim) => dim,
            None => {
                self.stats.pruned += 1;
                return;
            }
        };

        let diagonal = self.symmetric && ra == rb;
        let split_a = ra.len() >= self.threshold;
        let split_b = rb.len() >= self.threshold;

        match (split_a, split_b) {
            (false, false) => {
                self.stats.leaves += 1;
                leaf.visit(self.a, ra, self.b, rb);
            }
            (false, true) => {
                let (b1, b2) = halves(&rb);
                self.recurse(ra.clone(), b1, start_dim, leaf);
                self.recurse(ra, b2, start_dim, leaf);
            }
            (true, false) => {
                let (a1, a2) = halves(&ra);
                self.recurse(a1, rb.clone(), start_dim, leaf);
                self.recurse(a2, rb, start_dim, leaf);
            }
            (true, true) => {
                let (a1, a2) = halves(&ra);
                let (b1, b2) = halves(&rb);
                self.recurse(a1.clone(), b1.clone(), start_dim, leaf);
                self.recurse(a1, b2.clone(), start_dim, leaf);
                if !diagonal {
                    self.recurse(a2.clone(), b1, start_dim, leaf);
                }
                self.recurse(a2, b2, start_dim, leaf);
            }
        }
    }

    /// Returns ```None``` if no pair in ```ra``` x ```rb``` can lie within one grid cell in
    /// every dimension, otherwise the first dimension at or after ```start_dim``` in which
    /// either range spans more than one cell.
    fn prune(&self, ra: &Range<usize>, rb: &Range<usize>, start_dim: usize) -> Option<usize> {
        let (ka, kb) = (&self.a.keys, &self.b.keys);
        let (fst_a, lst_a) = (ra.start, ra.end - 1);
        let (fst_b, lst_b) = (rb.start, rb.end - 1);

        for d in start_dim..ka.ncols() {
            let (lo_a, hi_a) = (ka[[fst_a, d]], ka[[lst_a, d]]);
            let (lo_b, hi_b) = (kb[[fst_b, d]], kb[[lst_b, d]]);

            if lo_a > hi_b.saturating_add(1) || lo_b > hi_a.saturating_add(1) {
                return None;
            }

            if lo_a < hi_a || lo_b < hi_b {
                return Some(d);
            }
        }

        Some(start_dim)
    }
}

fn halves(r: &Range<usize>) -> (Range<usize>, Range<usize>) {
    let mid = r.start + r.len() / 2;
    (r.start..mid, mid..r.end)
}
