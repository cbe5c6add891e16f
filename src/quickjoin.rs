//! QuickJoin: recursive pivot partitioning with boundary windows.
//!
//! Based on Fredriksson, K., & Braithwaite, B. (2015). Quicker range- and k-NN joins in metric
//! spaces. Information Systems, 52, 189-204.

use ndarray::ArrayView1;
use rand::{rngs::StdRng, Rng};

use crate::error::{check_inputs, check_radius};
use crate::metric::ROUNDING_SLACK;
use crate::superego::seeded_rng;
use crate::{Dataset, Distance, JoinError, PointId, RangeJoin, Result, ResultCollector, Scalar};

/// Rows of one dataset taking part in a recursion step. Feature data is never copied.
#[derive(Debug)]
struct Subset<'a> {
    data: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> Subset<'a> {
    fn all(data: &'a Dataset) -> Self {
        Self {
            data,
            rows: (0..data.num_rows()).collect(),
        }
    }

    fn empty(data: &'a Dataset) -> Self {
        Self {
            data,
            rows: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, pos: usize) -> ArrayView1<'a, Scalar> {
        self.data.row(self.rows[pos])
    }

    fn id(&self, pos: usize) -> PointId {
        self.data.id(self.rows[pos])
    }
}

/// Split of a subset around a pivot ball of radius ```rho```.
#[derive(Debug)]
struct Partition<'a> {
    lower: Subset<'a>,
    greater: Subset<'a>,
    lower_win: Subset<'a>,
    greater_win: Subset<'a>,
}

#[derive(Clone, Copy, Debug, Default)]
struct QuickStats {
    partitions: usize,
    leaves: usize,
}

/// Range join by recursive ball partitioning around random pivots.
///
/// A subset is split into the points closer to a pivot ```p1``` than
/// ```rho = beta * d(p1, p2)``` and the rest. Points within the join radius of that boundary
/// form the windows, which are joined against each other so that no pair crossing the
/// boundary is lost. Partition distances are evaluated in [`Distance::to_metric`] units.
///
/// A self join records each matching pair once, in either direction.
#[derive(Debug)]
pub struct QuickJoin<D, C> {
    join_threshold: usize,
    beta: Scalar,
    allow_self_similar: bool,
    distance: D,
    collector: C,
    rng: StdRng,
    stats: QuickStats,
}

impl<D, C> QuickJoin<D, C>
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

    fn start(&mut self, a: &Dataset, b: &Dataset, eps: Scalar) -> Result<Scalar> {
        check_inputs(a, b, 1)?;
        check_radius(eps)?;
        let r_m = self.distance.to_metric(eps);
        if !(r_m.is_finite() && r_m >= 0.) {
            return Err(JoinError::InvalidArgument(format!(
                "radius {} maps to unusable metric radius {}",
                eps, r_m
            )));
        }

        self.collector.clear();
        self.stats = QuickStats::default();
        Ok(r_m)
    }

    fn finish(&self) {
        tracing::debug!(
            pairs = self.collector.len(),
            partitions = self.stats.partitions,
            leaves = self.stats.leaves,
            "quick_join_done"
        );
    }

    fn self_join(&mut self, s: Subset<'_>, eps: Scalar, r_m: Scalar) {
        if s.len() < self.join_threshold || s.len() < 2 {
            self.brute_self(&s, eps);
            return;
        }

        let (p1, p2) = self.pivots(&s, &Subset::empty(s.data));
        let rho = self.beta * self.distance.to_metric(self.distance.compute(p1, p2));
        let part = self.partition(&s, p1, rho, r_m);

        if part.lower.is_empty() || part.greater.is_empty() {
            self.brute_self(&s, eps);
            return;
        }

        self.join_win(part.lower_win, part.greater_win, eps, r_m);
        self.self_join(part.lower, eps, r_m);
        self.self_join(part.greater, eps, r_m);
    }

    fn join_win(&mut self, s1: Subset<'_>, s2: Subset<'_>, eps: Scalar, r_m: Scalar) {
        if s1.is_empty() || s2.is_empty() {
            return;
        }

        let total = s1.len() + s2.len();
        if total <= self.join_threshold {
            self.brute_cross(&s1, &s2, eps);
            return;
        }

        let (p1, p2) = self.pivots(&s1, &s2);
        let rho = self.beta * self.distance.to_metric(self.distance.compute(p1, p2));
        let part1 = self.partition(&s1, p1, rho, r_m);
        let part2 = self.partition(&s2, p1, rho, r_m);

        let no_lower = part1.lower.is_empty() && part2.lower.is_empty();
        let no_greater = part1.greater.is_empty() && part2.greater.is_empty();
        if no_lower || no_greater {
            self.brute_cross(&s1, &s2, eps);
            return;
        }

        self.descend(part1.lower_win, part2.greater_win, total, eps, r_m);
        self.descend(part1.greater_win, part2.lower_win, total, eps, r_m);
        self.join_win(part1.lower, part2.lower, eps, r_m);
        self.join_win(part1.greater, part2.greater, eps, r_m);
    }

    /// Window joins that did not shrink the input are finished exhaustively.
    fn descend(
        &mut self,
        s1: Subset<'_>,
        s2: Subset<'_>,
        total: usize,
        eps: Scalar,
        r_m: Scalar,
    ) {
        if s1.len() + s2.len() < total {
            self.join_win(s1, s2, eps, r_m);
        } else {
            self.brute_cross(&s1, &s2, eps);
        }
    }

    /// Two distinct positions drawn uniformly from the concatenation of ```s1``` and ```s2```.
    fn pivots<'a>(
        &mut self,
        s1: &Subset<'a>,
        s2: &Subset<'a>,
    ) -> (ArrayView1<'a, Scalar>, ArrayView1<'a, Scalar>) {
        let n = s1.len() + s2.len();
        let pos1 = self.rng.gen_range(0..n);
        let mut pos2 = self.rng.gen_range(0..n - 1);
        if pos2 >= pos1 {
            pos2 += 1;
        }

        let locate = |pos: usize| {
            if pos < s1.len() {
                s1.row(pos)
            } else {
                s2.row(pos - s1.len())
            }
        };

        (locate(pos1), locate(pos2))
    }

    fn partition<'a>(
        &mut self,
        s: &Subset<'a>,
        pivot: ArrayView1<'_, Scalar>,
        rho: Scalar,
        r_m: Scalar,
    ) -> Partition<'a> {
        self.stats.partitions += 1;
        // Window bounds are widened so points exactly on an edge are never lost to rounding.
        let slack = (rho.abs() + r_m) * ROUNDING_SLACK;
        let mut part = Partition {
            lower: Subset::empty(s.data),
            greater: Subset::empty(s.data),
            lower_win: Subset::empty(s.data),
            greater_win: Subset::empty(s.data),
        };

        for (pos, &row) in s.rows.iter().enumerate() {
            let d = self.distance.to_metric(self.distance.compute(s.row(pos), pivot));
            if d < rho {
                part.lower.rows.push(row);
                if rho - r_m - slack <= d {
                    part.lower_win.rows.push(row);
                }
            } else {
                part.greater.rows.push(row);
                if d <= rho + r_m + slack {
                    part.greater_win.rows.push(row);
                }
            }
        }

        part
    }

    fn brute_self(&mut self, s: &Subset<'_>, eps: Scalar) {
        self.stats.leaves += 1;
        for i in 0..s.len() {
            let p = s.row(i);
            if self.allow_self_similar && self.distance.compute(p, p) <= eps {
                self.collector.add_pair(s.id(i), s.id(i));
            }

            for j in i + 1..s.len() {
                if self.distance.compute(p, s.row(j)) <= eps {
                    self.collector.add_pair(s.id(i), s.id(j));
                }
            }
        }
    }

    fn brute_cross(&mut self, s1: &Subset<'_>, s2: &Subset<'_>, eps: Scalar) {
        self.stats.leaves += 1;
        for i in 0..s1.len() {
            let p = s1.row(i);
            let pid = s1.id(i);

            for j in 0..s2.len() {
                let qid = s2.id(j);
                if !self.allow_self_similar && pid == qid {
                    continue;
                }

                if self.distance.compute(p, s2.row(j)) <= eps {
                    self.collector.add_pair(pid, qid);
                }
            }
        }
    }
}

impl<D, C> RangeJoin for QuickJoin<D, C>
where
    D: Distance,
    C: ResultCollector,
{
    fn range(&mut self, data: &Dataset, eps: Scalar) -> Result<()> {
        let r_m = self.start(data, data, eps)?;
        tracing::debug!(rows = data.num_rows(), eps, "quick_join_self_start");

        self.self_join(Subset::all(data), eps, r_m);
        self.finish();
        Ok(())
    }

    fn range_between(&mut self, a: &Dataset, b: &Dataset, eps: Scalar) -> Result<()> {
        let r_m = self.start(a, b, eps)?;
        tracing::debug!(
            rows_a = a.num_rows(),
            rows_b = b.num_rows(),
            eps,
            "quick_join_start"
        );

        self.join_win(Subset::all(a), Subset::all(b), eps, r_m);
        self.finish();
        Ok(())
    }
}

/// A build struct for configuring a [`QuickJoin`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuickJoinBuilder {
    join_threshold: Option<usize>,
    beta: Option<Scalar>,
    allow_self_similar: Option<bool>,
    seed: Option<u64>,
}

impl QuickJoinBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Subsets below this size are compared exhaustively. Defaults to ```1000```.
    pub fn join_threshold(mut self, c: usize) -> Self {
        self.join_threshold = Some(c);
        self
    }

    /// Multiplier of the pivot distance giving the partition radius. Defaults to ```1```.
    pub fn beta(mut self, beta: Scalar) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Whether a point may be paired with a point carrying the same id. Defaults to ```false```.
    pub fn allow_self_similar(mut self, allow: bool) -> Self {
        self.allow_self_similar = Some(allow);
        self
    }

    /// Seeds pivot selection, making the recursion reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Constructs the join with the given distance function and result sink.
    pub fn build<D, C>(self, distance: D, collector: C) -> Result<QuickJoin<D, C>> {
        let beta = self.beta.unwrap_or(1.);
        if !(beta.is_finite() && beta > 0.) {
            return Err(JoinError::InvalidArgument(format!(
                "beta must be a positive finite number, got {}",
                beta
            )));
        }

        Ok(QuickJoin {
            join_threshold: self.join_threshold.unwrap_or(1000),
            beta,
            allow_self_similar: self.allow_self_similar.unwrap_or(false),
            distance,
            collector,
            rng: seeded_rng(self.seed),
            stats: QuickStats::default(),
        })
    }
}
