use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::{check_inputs, check_radius};
use crate::{
    Dataset, Distance, JoinError, KnnJoin, PointId, RangeJoin, Result, ResultCollector, Scalar,
};

/// Exhaustive join comparing every point of one dataset with every point of the other.
///
/// Both datasets must hold more than one row. With ```parallel``` enabled, the candidates of
/// each query point are evaluated on the rayon pool, but pairs still reach the collector in the
/// same order as the sequential scan.
#[derive(Clone, Debug)]
pub struct BruteForceJoin<D, C> {
    allow_self_similar: bool,
    parallel: bool,
    distance: D,
    collector: C,
}

impl<D, C> BruteForceJoin<D, C>
where
    D: Distance + Sync,
    C: ResultCollector,
{
    /// Creates a sequential join that skips self pairs.
    pub fn new(distance: D, collector: C) -> Self {
        BruteForceJoinBuilder::new().build(distance, collector)
    }

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

    fn join(&mut self, a: &Dataset, b: &Dataset, eps: Scalar, self_join: bool) -> Result<()> {
        check_inputs(a, b, 2)?;
        check_radius(eps)?;

        self.collector.clear();
        tracing::debug!(
            rows_a = a.num_rows(),
            rows_b = b.num_rows(),
            eps,
            self_join,
            "brute_force_range_start"
        );

        let distance = &self.distance;
        let allow = self.allow_self_similar;

        if self.parallel {
            let matches: Vec<Vec<PointId>> = (0..a.num_rows())
                .into_par_iter()
                .map(|i| range_matches(distance, allow, a, i, b, eps))
                .collect();

            for (i, partners) in matches.into_iter().enumerate() {
                for q in partners {
                    self.collector.add_pair(a.id(i), q);
                }
            }
        } else {
            for i in 0..a.num_rows() {
                for q in range_matches(distance, allow, a, i, b, eps) {
                    self.collector.add_pair(a.id(i), q);
                }
            }
        }

        tracing::debug!(pairs = self.collector.len(), "brute_force_range_done");
        Ok(())
    }

    fn join_knn(&mut self, a: &Dataset, b: &Dataset, k: usize) -> Result<()> {
        check_inputs(a, b, 2)?;
        if k == 0 {
            return Err(JoinError::InvalidArgument("k must be positive".into()));
        }

        self.collector.clear();
        tracing::debug!(
            rows_a = a.num_rows(),
            rows_b = b.num_rows(),
            k,
            "brute_force_knn_start"
        );

        let distance = &self.distance;
        let allow = self.allow_self_similar;

        let neighbours: Vec<Vec<Candidate>> = if self.parallel {
            (0..a.num_rows())
                .into_par_iter()
                .map(|i| nearest(distance, allow, a, i, b, k))
                .collect()
        } else {
            (0..a.num_rows())
                .map(|i| nearest(distance, allow, a, i, b, k))
                .collect()
        };

        for (i, found) in neighbours.into_iter().enumerate() {
            for c in found {
                self.collector.add_pair(a.id(i), c.id);
            }
        }

        tracing::debug!(pairs = self.collector.len(), "brute_force_knn_done");
        Ok(())
    }
}

impl<D, C> RangeJoin for BruteForceJoin<D, C>
where
    D: Distance + Sync,
    C: ResultCollector,
{
    fn range(&mut self, data: &Dataset, eps: Scalar) -> Result<()> {
        self.join(data, data, eps, true)
    }

    fn range_between(&mut self, a: &Dataset, b: &Dataset, eps: Scalar) -> Result<()> {
        self.join(a, b, eps, false)
    }
}

impl<D, C> KnnJoin for BruteForceJoin<D, C>
where
    D: Distance + Sync,
    C: ResultCollector,
{
    fn knn(&mut self, data: &Dataset, k: usize) -> Result<()> {
        self.join_knn(data, data, k)
    }

    fn knn_between(&mut self, a: &Dataset, b: &Dataset, k: usize) -> Result<()> {
        self.join_knn(a, b, k)
    }
}

/// Ids of all points of ```b``` within ```eps``` of row ```i``` of ```a```, in row order of ```b```.
fn range_matches<D: Distance>(
    distance: &D,
    allow_self_similar: bool,
    a: &Dataset,
    i: usize,
    b: &Dataset,
    eps: Scalar,
) -> Vec<PointId> {
    let p = a.row(i);
    let pid = a.id(i);

    b.iter()
        .filter(|&(qid, _)| allow_self_similar || qid != pid)
        .filter(|(_, q)| distance.compute(p, q.view()) <= eps)
        .map(|(qid, _)| qid)
        .collect()
}

/// The ```k``` closest points of ```b``` to row ```i``` of ```a```, nearest first. Equal
/// distances prefer the lower id.
fn nearest<D: Distance>(
    distance: &D,
    allow_self_similar: bool,
    a: &Dataset,
    i: usize,
    b: &Dataset,
    k: usize,
) -> Vec<Candidate> {
    let p = a.row(i);
    let pid = a.id(i);
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (qid, q) in b.iter() {
        if !allow_self_similar && qid == pid {
            continue;
        }

        let candidate = Candidate {
            dist: distance.compute(p, q),
            id: qid,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(mut worst) = heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    heap.into_sorted_vec()
}

/// Max-heap entry: the farthest kept neighbour sits on top.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    dist: Scalar,
    id: PointId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A build struct for configuring a [`BruteForceJoin`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BruteForceJoinBuilder {
    allow_self_similar: Option<bool>,
    parallel: Option<bool>,
}

impl BruteForceJoinBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Whether a point may be paired with a point carrying the same id. Defaults to ```false```.
    pub fn allow_self_similar(mut self, allow: bool) -> Self {
        self.allow_self_similar = Some(allow);
        self
    }

    /// Evaluates query points on the rayon thread pool. Defaults to ```false```.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Constructs the join with the given distance function and result sink.
    pub fn build<D, C>(self, distance: D, collector: C) -> BruteForceJoin<D, C> {
        BruteForceJoin {
            allow_self_similar: self.allow_self_similar.unwrap_or(false),
            parallel: self.parallel.unwrap_or(false),
            distance,
            collector,
        }
    }
}
