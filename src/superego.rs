//! Super-EGO: epsilon grid ordering with divide-and-conquer and dimension reordering.
//!
//! Based on Kalashnikov, D. V. (2013). Super-EGO: Fast Multi-dimensional Similarity Join.
//! VLDB Journal, 22(4), 561-585.

use std::ops::Range;

use rand::{rngs::StdRng, SeedableRng};

use crate::error::{check_inputs, check_radius};
use crate::grid::{
    check_sample_ratio, grid_width, working_grids, DimensionStats, EgoJoin, Grid, Leaf,
};
use crate::{Dataset, Distance, RangeJoin, Result, ResultCollector, Scalar};

/// Range join over grid-sorted working copies.
///
/// Each call to [`RangeJoin::range`] clones its input, optionally reorders the dimensions,
/// sorts the copy by grid cell (cell width derived from ```eps``` through
/// [`Distance::to_metric`]) and recursively halves row ranges, discarding pairs of ranges that
/// are more than one cell apart in some dimension. Ranges shorter than the join threshold are
/// compared exhaustively.
///
/// A self join records every match in both directions, each exactly once.
#[derive(Debug)]
pub struct SuperEgo<D, C> {
    join_threshold: usize,
    reorder_dimensions: bool,
    sample_ratio: Scalar,
    allow_self_similar: bool,
    distance: D,
    collector: C,
    rng: StdRng,
    dimension_stats: Option<DimensionStats>,
}

impl<D, C> SuperEgo<D, C>
where
    D: Distance,
    C: ResultCollector,
{
    /// Returns the collector holding the last result.
    pub fn collector(&self) -> &C {
        &self.collector
    }

    /// Returns the collector mutably.
    pub fn collector_mut(&mut self) -> &mut C {
        &mut self.collector
    }

    /// Consumes the join and returns its collector.
    pub fn into_collector(self) -> C {
        self.collector
    }

    /// Statistics of the last dimension reordering, if it was enabled.
    pub fn dimension_stats(&self) -> Option<&DimensionStats> {
        self.dimension_stats.as_ref()
    }

    fn join(&mut self, a: &Dataset, b: Option<&Dataset>, eps: Scalar) -> Result<()> {
        check_inputs(a, b.unwrap_or(a), 1)?;
        check_radius(eps)?;
        let width = grid_width(&self.distance, eps)?;

        self.collector.clear();
        let self_join = b.is_none();
        tracing::debug!(
            rows_a = a.num_rows(),
            rows_b = b.map_or(a.num_rows(), Dataset::num_rows),
            cols = a.num_cols(),
            eps,
            width,
            self_join,
            "super_ego_start"
        );

        let reorder = if self.reorder_dimensions {
            Some((self.sample_ratio, &mut self.rng))
        } else {
            None
        };
        let (ga, gb, stats) = working_grids(a, b, width, reorder);
        self.dimension_stats = stats;

        let mut leaf = PairLeaf {
            distance: &self.distance,
            collector: &mut self.collector,
            eps,
            allow_self_similar: self.allow_self_similar,
            self_join,
        };
        let mut driver = EgoJoin::new(
            &ga,
            gb.as_ref().unwrap_or(&ga),
            self.join_threshold,
            self_join,
        );
        driver.run(&mut leaf);

        tracing::debug!(
            pairs = self.collector.len(),
            leaves = driver.stats.leaves,
            pruned = driver.stats.pruned,
            "super_ego_done"
        );
        Ok(())
    }
}

impl<D, C> RangeJoin for SuperEgo<D, C>
where
    D: Distance,
    C: ResultCollector,
{
    fn range(&mut self, data: &Dataset, eps: Scalar) -> Result<()> {
        self.join(data, None, eps)
    }

    fn range_between(&mut self, a: &Dataset, b: &Dataset, eps: Scalar) -> Result<()> {
        self.join(a, Some(b), eps)
    }
}

/// Exhaustive comparison of two leaf ranges, reporting matches to a collector.
struct PairLeaf<'j, D, C> {
    distance: &'j D,
    collector: &'j mut C,
    eps: Scalar,
    allow_self_similar: bool,
    self_join: bool,
}

impl<D: Distance, C: ResultCollector> Leaf for PairLeaf<'_, D, C> {
    fn visit(&mut self, a: &Grid, ra: Range<usize>, b: &Grid, rb: Range<usize>) {
        // A diagonal block of a self join only scans its upper triangle.
        let diagonal = self.self_join && ra == rb;

        for i in ra {
            let p = a.data.row(i);
            let pid = a.data.id(i);
            let from = if diagonal { i } else { rb.start };

            for j in from..rb.end {
                let qid = b.data.id(j);
                if !self.allow_self_similar && pid == qid {
                    continue;
                }

                if self.distance.compute(p, b.data.row(j)) <= self.eps {
                    self.collector.add_pair(pid, qid);
                    if self.self_join && i != j {
                        self.collector.add_pair(qid, pid);
                    }
                }
            }
        }
    }
}

/// A build struct for configuring a [`SuperEgo`] join.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SuperEgoBuilder {
    join_threshold: Option<usize>,
    reorder_dimensions: Option<bool>,
    sample_ratio: Option<Scalar>,
    allow_self_similar: Option<bool>,
    seed: Option<u64>,
}

impl SuperEgoBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self {
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

    /// Whether a point may be paired with a point carrying the same id. Defaults to ```false```.
    pub fn allow_self_similar(mut self, allow: bool) -> Self {
        self.allow_self_similar = Some(allow);
        self
    }

    /// Seeds the sampler used by dimension reordering.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Constructs the join with the given distance function and result sink.
    pub fn build<D, C>(self, distance: D, collector: C) -> Result<SuperEgo<D, C>> {
        let sample_ratio = check_sample_ratio(self.sample_ratio)?;

        Ok(SuperEgo {
            join_threshold: self.join_threshold.unwrap_or(1000),
            reorder_dimensions: self.reorder_dimensions.unwrap_or(false),
            sample_ratio,
            allow_self_similar: self.allow_self_similar.unwrap_or(false),
            distance,
            collector,
            rng: seeded_rng(self.seed),
            dimension_stats: None,
        })
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
