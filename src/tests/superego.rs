use std::collections::BTreeSet;

use ndarray::Array2;

use super::{brute_between, brute_self, lattice_dataset, ordered, random_dataset, two_clusters};
use crate::{
    BruteForceJoin, Dataset, JoinError, Metric, NeighborMap, PairList, RangeJoin,
    ResultCollector, SuperEgoBuilder,
};

#[test]
fn test_two_clusters() {
    let data = two_clusters();
    let expected: BTreeSet<_> = [(0, 1), (1, 0), (2, 3), (3, 2)].iter().copied().collect();

    for &t in [1, 2, 1000].iter() {
        let mut join = SuperEgoBuilder::new()
            .join_threshold(t)
            .build(Metric::SquaredEuclidean, PairList::new())
            .unwrap();
        join.range(&data, 0.02).unwrap();

        assert_eq!(join.collector().len(), 4, "t = {}", t);
        assert_eq!(ordered(join.collector()), expected, "t = {}", t);
    }
}

#[test]
fn test_self_join_matches_brute_force() {
    for &seed in [1u64, 2, 3].iter() {
        let data = random_dataset(seed, 300, 3);
        let expected = brute_self(&data, 0.01);

        for &t in [2, 5, 1000].iter() {
            let mut join = SuperEgoBuilder::new()
                .join_threshold(t)
                .build(Metric::SquaredEuclidean, PairList::new())
                .unwrap();
            join.range(&data, 0.01).unwrap();

            // No pair is reported twice.
            assert_eq!(join.collector().len(), expected.len());
            assert_eq!(ordered(join.collector()), expected);
        }
    }
}

#[test]
fn test_binary_join_matches_brute_force() {
    let a = random_dataset(11, 150, 3);
    let b = random_dataset(12, 120, 3);
    let expected = brute_between(&a, &b, 0.02);
    assert!(!expected.is_empty());

    for &t in [2, 7, 1000].iter() {
        let mut join = SuperEgoBuilder::new()
            .join_threshold(t)
            .build(Metric::SquaredEuclidean, PairList::new())
            .unwrap();
        join.range_between(&a, &b, 0.02).unwrap();

        assert_eq!(join.collector().len(), expected.len());
        assert_eq!(ordered(join.collector()), expected);
    }
}

#[test]
fn test_lattice_points_on_cell_edges() {
    for seed in 0..20u64 {
        let a = lattice_dataset(seed, 60, 3);
        let b = lattice_dataset(seed + 100, 50, 3);

        for &eps in [0.01, 0.04, 0.09].iter() {
            let mut join = SuperEgoBuilder::new()
                .join_threshold(3)
                .build(Metric::SquaredEuclidean, PairList::new())
                .unwrap();

            join.range(&a, eps).unwrap();
            assert_eq!(ordered(join.collector()), brute_self(&a, eps), "eps = {}", eps);

            join.range_between(&a, &b, eps).unwrap();
            assert_eq!(ordered(join.collector()), brute_between(&a, &b, eps), "eps = {}", eps);
        }
    }
}

#[test]
fn test_negative_coordinates() {
    let data = Dataset::from_array(random_dataset(5, 250, 2).values().mapv(|v| v * 4. - 2.));
    let expected = brute_self(&data, 0.05);

    let mut join = SuperEgoBuilder::new()
        .join_threshold(4)
        .build(Metric::SquaredEuclidean, NeighborMap::new())
        .unwrap();
    join.range(&data, 0.05).unwrap();
    assert_eq!(ordered(join.collector()), expected);
}

#[test]
fn test_reorder_dimensions() {
    let mut rng = oorandom::Rand64::new(21);
    let values = Array2::from_shape_fn((400, 3), |(_, col)| {
        let scale = [0.01, 10., 1.][col];
        rng.rand_float() * scale
    });
    let data = Dataset::from_array(values);
    let before = data.clone();
    let expected = brute_self(&data, 0.5);

    let mut join = SuperEgoBuilder::new()
        .join_threshold(8)
        .reorder_dimensions(true)
        .sample_ratio(0.5)
        .seed(3)
        .build(Metric::SquaredEuclidean, NeighborMap::new())
        .unwrap();
    join.range(&data, 0.5).unwrap();

    let stats = join.dimension_stats().unwrap();
    assert_eq!(stats.order(), &[1, 2, 0]);
    assert_eq!(stats.sample_size(), 200);
    assert_eq!(stats.mean_gap().len(), 3);
    assert!(stats.fail_factor().iter().all(|&f| (0. ..=1.).contains(&f)));

    assert_eq!(data, before);
    assert_eq!(ordered(join.collector()), expected);
}

#[test]
fn test_allow_self_similar() {
    let data = two_clusters();
    let mut join = SuperEgoBuilder::new()
        .join_threshold(2)
        .allow_self_similar(true)
        .build(Metric::SquaredEuclidean, PairList::new())
        .unwrap();
    join.range(&data, 0.02).unwrap();

    let pairs = join.collector().pairs();
    assert_eq!(pairs.len(), 8);
    for id in 0..4 {
        assert_eq!(pairs.iter().filter(|&&p| p == (id, id)).count(), 1);
    }
}

#[test]
fn test_euclidean_metric() {
    let data = random_dataset(8, 200, 4);

    let mut brute = BruteForceJoin::new(Metric::Euclidean, NeighborMap::new());
    brute.range(&data, 0.2).unwrap();

    let mut join = SuperEgoBuilder::new()
        .join_threshold(3)
        .build(Metric::Euclidean, NeighborMap::new())
        .unwrap();
    join.range(&data, 0.2).unwrap();

    assert!(!brute.collector().is_empty());
    assert_eq!(join.collector(), brute.collector());
}

#[test]
fn test_invalid_arguments() {
    assert!(matches!(
        SuperEgoBuilder::new().sample_ratio(0.).build(Metric::SquaredEuclidean, PairList::new()),
        Err(JoinError::InvalidArgument(_))
    ));
    assert!(matches!(
        SuperEgoBuilder::new().sample_ratio(1.5).build(Metric::SquaredEuclidean, PairList::new()),
        Err(JoinError::InvalidArgument(_))
    ));

    let data = two_clusters();
    let mut join = SuperEgoBuilder::new()
        .build(Metric::SquaredEuclidean, PairList::new())
        .unwrap();
    join.collector_mut().add_pair(9, 9);

    assert!(matches!(
        join.range(&data, -1.),
        Err(JoinError::InvalidArgument(_))
    ));
    let flat = Dataset::from_array(Array2::zeros((3, 1)));
    assert!(matches!(
        join.range_between(&data, &flat, 1.),
        Err(JoinError::DimensionMismatch { left: 2, right: 1 })
    ));
    assert_eq!(join.into_collector().pairs(), vec![(9, 9)]);
}
