use std::collections::BTreeSet;

use ndarray::{array, Array2};

use crate::{BruteForceJoin, Dataset, Metric, NeighborMap, PointId, RangeJoin, ResultCollector};

mod dataset;
mod outlier;
mod superego;

/// Two well separated clusters of two points each.
///
/// Squared distances: d(0, 1) = 0.005, d(2, 3) = 0.0005, everything else > 100.
pub(crate) fn two_clusters() -> Dataset {
    Dataset::from_array(array![[0., 0.], [0.05, 0.05], [10., 10.], [10.02, 10.01]])
}

pub(crate) fn random_dataset(seed: u64, nrows: usize, ncols: usize) -> Dataset {
    let mut rng = oorandom::Rand64::new(seed as u128);
    Dataset::from_array(Array2::from_shape_simple_fn((nrows, ncols), || {
        rng.rand_float()
    }))
}

/// Coordinates drawn from the lattice ```{0, 0.1, ..., 0.5}```, so many pairs lie exactly on
/// window and cell edges.
pub(crate) fn lattice_dataset(seed: u64, nrows: usize, ncols: usize) -> Dataset {
    let mut rng = oorandom::Rand64::new(seed as u128);
    Dataset::from_array(Array2::from_shape_simple_fn((nrows, ncols), || {
        rng.rand_range(0..6) as f64 * 0.1
    }))
}

pub(crate) fn ordered<C: ResultCollector>(collector: &C) -> BTreeSet<(PointId, PointId)> {
    collector.pairs().into_iter().collect()
}

pub(crate) fn unordered<C: ResultCollector>(collector: &C) -> BTreeSet<(PointId, PointId)> {
    collector
        .pairs()
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect()
}

pub(crate) fn brute_self(data: &Dataset, eps: f64) -> BTreeSet<(PointId, PointId)> {
    let mut join = BruteForceJoin::new(Metric::SquaredEuclidean, NeighborMap::new());
    join.range(data, eps).unwrap();
    ordered(join.collector())
}

pub(crate) fn brute_between(a: &Dataset, b: &Dataset, eps: f64) -> BTreeSet<(PointId, PointId)> {
    let mut join = BruteForceJoin::new(Metric::SquaredEuclidean, NeighborMap::new());
    join.range_between(a, b, eps).unwrap();
    ordered(join.collector())
}

/// Exact neighbour count of every row of ```a``` among the rows of ```b```, skipping equal ids.
pub(crate) fn neighbour_counts(a: &Dataset, b: &Dataset, eps: f64) -> Vec<usize> {
    use crate::Distance;

    a.iter()
        .map(|(pid, p)| {
            b.iter()
                .filter(|&(qid, _)| qid != pid)
                .filter(|(_, q)| Metric::SquaredEuclidean.compute(p, q.view()) <= eps)
                .count()
        })
        .collect()
}
