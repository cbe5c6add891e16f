//! Distance-based outlier detection on top of the Super-EGO join.

use std::ops::Range;

use rand::rngs::StdRng;

use crate::error::{check_inputs, check_radius};
use crate::grid::{
    check_sample_ratio, grid_width, working_grids, DimensionStats, EgoJoin, Grid, Leaf,
};
use crate::superego::seeded_rng;
use crate::{Dataset, Distance, PointId, RangeJoin, Result, Scalar};

/// Counts the ```eps```-neighbours of every point and flags points with few of them.
///
/// The join follows [`SuperEgo`](crate::SuperEgo), but its leaves only increment a counter for
/// the query point (the partner's counter is left alone) and stop scanning partners once the
/// counter exceeds the outlier threshold. All four sub-rectangles are visited at every level,
/// so every ordered pair is examined from its query side and, after a join, each counter
/// equals ```min(neighbours, outlier_threshold + 1)```.
///
/// A point is an outlier when its counter does not exceed the outlier threshold.
#[derive(Debug)]
pub struct OutlierJoin<D> {
    outlier_threshold: usize,
    join_threshold: usize,
    reorder_dimensions: bool,
    sample_ratio: Scalar,
    allow_self_similar: bool,
    distance: D,
    rng: StdRng,
    ids: Vec<PointId>,
    counts: Vec<usize>,
    dimension_stats: Option<DimensionStats>,
}

impl<D: Distance> OutlierJoin<D> {
    /// Returns the configured outlier threshold.
    pub fn outlier_threshold(&self) -> usize {
        self.outlier_threshold
    }

    /// Neighbour counters of the last join, in row order of the (first) input dataset.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Outlier flag of every point of the last join, in row order.
    pub fn flags(&self) -> Vec<bool> {
        self.counts
            .iter()
            .map(|&count| count <= self.outlier_threshold)
            .collect()
    }

    /// Ids of the points flagged as outliers by the last join, in row order.
    pub fn outlier_ids(&self) -> Vec<PointId> {
        self.ids
            .iter()
            .zip(self.counts.iter())
            .filter(|&(_, &count)| count <= self.outlier_threshold)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Statistics of the last dimension reordering, if it was enabled.
    pub fn dimension_stats(&self) -> Option<&DimensionStats> {
        self.dimension_stats.as_ref()
    }

    fn join(&mut self, a: &Dataset, b: Option<&Dataset>, eps: Scalar) -> Result<()> {
        check_inputs(a, b.unwrap_or(a), 1)?;
        check_radius(eps)?;
        let width = grid_width(&self.distance, eps)?;

        self.ids = a.ids().to_vec();
        self.counts = vec![0; a.num_rows()];
        tracing::debug!(
            rows_a = a.num_rows(),
            rows_b = b.map_or(a.num_rows(), Dataset::num_rows),
            eps,
            outlier_threshold = self.outlier_threshold,
            "outlier_join_start"
        );

        let reorder = if self.reorder_dimensions {
            Some((self.sample_ratio, &mut self.rng))
        } else {
            None
        };
        let (ga, gb, stats) = working_grids(a, b, width, reorder);
        self.dimension_stats = stats;

        let mut leaf = CountLeaf {
            distance: &self.distance,
            counts: &mut self.counts,
            eps,
            allow_self_similar: self.allow_self_similar,
            cap: self.outlier_threshold,
        };
        let mut driver = EgoJoin::new(
            &ga,
            gb.as_ref().unwrap_or(&ga),
            self.join_threshold,
            false,
        );
        driver.run(&mut leaf);

        let outliers = self
            .counts
            .iter()
            .filter(|&&count| count <= self.outlier_threshold)
            .count();
        tracing::debug!(
            outliers,
            leaves = driver.stats.leaves,
            pruned = driver.stats.pruned,
            "outlier_join_done"
        );
        Ok(())
    }
}

impl<D: Distance> RangeJoin for OutlierJoin<D> {
    fn range(&mut self, data: &Dataset, eps: Scalar) -> Result<()> {
        self.join(data, None, eps)
    }

    /// Counts, for every point of ```a```, its neighbours in ```b```.
    fn range_between(&mut self, a: &Dataset, b: &Dataset, eps: Scalar) -> Result<()> {
        self.join(a, Some(b), eps)
    }
}

struct CountLeaf<'j, D> {
    distance: &'j D,
    counts: &'j mut [usize],
    eps: Scalar,
    allow_self_similar: bool,
    cap: usize,
}

impl<D: Distance> Leaf for CountLeaf<'_, D> {
    fn visit(&mut self, a: &Grid, ra: Range<usize>, b: &Grid, rb: Range<usize>) {
        for i in ra {
            let slot = a.origin[i];
            if self.counts[slot] > self.cap {
                continue;
            }

            let p = a.data.row(i);
            let pid = a.data.id(i);

            for j in rb.clone() {
                if !self.allow_self_similar && pid == b.data.id(j) {
                    continue;
                }

                if self.distance.compute(p, b.data.row(j)) <= self.eps {
                    self.counts[slot] += 1;
                    if self.counts[slot] > self.cap {
                        break;
                    }
                }
            }
        }
    }
}

/// A build struct for configuring an [`OutlierJoin`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutlierJoinBuilder {
    outlier_threshold: usize,
    join_threshold: Option<usize>,
    reorder_dimensions: Option<bool>,
    sample_ratio: Option<Scalar>,
    allow_self_similar: Option<bool>,
    seed: Option<u64>,
}

impl OutlierJoinBuilder {
    /// Creates a builder. Points with at most ```outlier_threshold``` neighbours are outliers.
    pub fn new(outlier_threshold: usize) -> Self {
        Self {
            outlier_threshold,
            ..Default::default()
        }
    }

    /// Ranges shorter than ```t``` rows are compared exhaustively. Defaults to ```1000```.
    pub fn join_threshold(mut self, t: usize) -> Self {
        self.join_threshold = Some(t);
        self
    }

    /// Reorders dimensions by sampled selectivity before sorting. Defaults to ```false```.
    pub fn reorder_dimensions(mut self, reorder: bool) -> Self {
        self.reorder_dimensions = Some(reorder);
        self
    }

    /// Fraction of rows sampled for dimension reordering, in ```(0, 1]```. Defaults to ```0.2```.
    pub fn sample_ratio(mut self, ratio: Scalar) -> Self {
        self.sample_ratio = Some(ratio);
        self
    }

    /// Whether a point counts itself (or a point with the same id) as a neighbour. Defaults to
    /// ```false```.
    pub fn allow_self_similar(mut self, allow: bool) -> Self {
        self.allow_self_similar = Some(allow);
        self
    }

    /// Seeds the sampler used by dimension reordering.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Constructs the join with the given distance function.
    pub fn build<D>(self, distance: D) -> Result<OutlierJoin<D>> {
        let sample_ratio = check_sample_ratio(self.sample_ratio)?;

        Ok(OutlierJoin {
            outlier_threshold: self.outlier_threshold,
            join_threshold: self.join_threshold.unwrap_or(1000),
            reorder_dimensions: self.reorder_dimensions.unwrap_or(false),
            sample_ratio,
            allow_self_similar: self.allow_self_similar.unwrap_or(false),
            distance,
            rng: seeded_rng(self.seed),
            ids: Vec::new(),
            counts: Vec::new(),
            dimension_stats: None,
        })
    }
}
