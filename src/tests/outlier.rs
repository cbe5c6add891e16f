use super::{neighbour_counts, random_dataset, two_clusters};
use crate::{Dataset, JoinError, Metric, OutlierJoinBuilder, RangeJoin};

#[test]
fn test_two_clusters() {
    let data = two_clusters();

    let mut join = OutlierJoinBuilder::new(0)
        .join_threshold(2)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    join.range(&data, 0.02).unwrap();
    assert_eq!(join.counts(), &[1, 1, 1, 1]);
    assert_eq!(join.flags(), vec![false; 4]);
    assert!(join.outlier_ids().is_empty());

    let mut join = OutlierJoinBuilder::new(1)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    join.range(&data, 0.02).unwrap();
    assert_eq!(join.outlier_threshold(), 1);
    assert_eq!(join.counts(), &[1, 1, 1, 1]);
    assert_eq!(join.flags(), vec![true; 4]);
    assert_eq!(join.outlier_ids(), vec![0, 1, 2, 3]);
}

#[test]
fn test_counts_are_capped_neighbour_counts() {
    let data = random_dataset(3, 300, 3);
    let exact = neighbour_counts(&data, &data, 0.01);

    for &t in [2, 5, 1000].iter() {
        for &threshold in [0, 3, 10].iter() {
            let mut join = OutlierJoinBuilder::new(threshold)
                .join_threshold(t)
                .build(Metric::SquaredEuclidean)
                .unwrap();
            join.range(&data, 0.01).unwrap();

            let capped: Vec<usize> = exact.iter().map(|&n| n.min(threshold + 1)).collect();
            assert_eq!(join.counts(), capped.as_slice(), "t = {}", t);

            let flags: Vec<bool> = exact.iter().map(|&n| n <= threshold).collect();
            assert_eq!(join.flags(), flags);
        }
    }
}

#[test]
fn test_reordered_counts() {
    let data = Dataset::from_array(random_dataset(4, 250, 4).values().mapv(|v| v * 3. - 1.));
    let exact = neighbour_counts(&data, &data, 0.1);

    let mut join = OutlierJoinBuilder::new(5)
        .join_threshold(6)
        .reorder_dimensions(true)
        .seed(12)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    join.range(&data, 0.1).unwrap();

    assert!(join.dimension_stats().is_some());
    let capped: Vec<usize> = exact.iter().map(|&n| n.min(6)).collect();
    assert_eq!(join.counts(), capped.as_slice());
}

#[test]
fn test_binary_join() {
    let a = random_dataset(5, 120, 2);
    let b = random_dataset(6, 200, 2);
    let exact = neighbour_counts(&a, &b, 0.004);

    let mut join = OutlierJoinBuilder::new(2)
        .join_threshold(4)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    join.range_between(&a, &b, 0.004).unwrap();

    assert_eq!(join.counts().len(), a.num_rows());
    let expected: Vec<usize> = a
        .ids()
        .iter()
        .zip(exact.iter())
        .filter(|&(_, &n)| n <= 2)
        .map(|(&id, _)| id)
        .collect();
    assert_eq!(join.outlier_ids(), expected);
}

#[test]
fn test_outliers_grow_with_threshold() {
    let data = random_dataset(7, 200, 2);
    let mut previous = 0;

    for threshold in 0..8 {
        let mut join = OutlierJoinBuilder::new(threshold)
            .join_threshold(8)
            .build(Metric::SquaredEuclidean)
            .unwrap();
        join.range(&data, 0.002).unwrap();

        let outliers = join.outlier_ids().len();
        assert!(outliers >= previous, "threshold = {}", threshold);
        previous = outliers;
    }
}

#[test]
fn test_outliers_shrink_with_radius() {
    let data = random_dataset(8, 200, 2);
    let mut join = OutlierJoinBuilder::new(3)
        .join_threshold(8)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    let mut previous = usize::MAX;

    for &eps in [1e-4, 1e-3, 5e-3, 2e-2, 1e-1].iter() {
        join.range(&data, eps).unwrap();

        let outliers = join.outlier_ids().len();
        assert!(outliers <= previous, "eps = {}", eps);
        previous = outliers;
    }
    assert_eq!(previous, 0);
}

#[test]
fn test_self_similar_counts_itself() {
    let data = two_clusters();
    let mut join = OutlierJoinBuilder::new(1)
        .allow_self_similar(true)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    join.range(&data, 0.02).unwrap();

    assert_eq!(join.counts(), &[2, 2, 2, 2]);
    assert_eq!(join.flags(), vec![false; 4]);
}

#[test]
fn test_invalid_arguments() {
    assert!(matches!(
        OutlierJoinBuilder::new(1)
            .sample_ratio(-0.5)
            .build(Metric::SquaredEuclidean),
        Err(JoinError::InvalidArgument(_))
    ));

    let data = two_clusters();
    let mut join = OutlierJoinBuilder::new(1)
        .build(Metric::SquaredEuclidean)
        .unwrap();
    assert!(matches!(
        join.range(&data, f64::INFINITY),
        Err(JoinError::InvalidArgument(_))
    ));

    let other = Dataset::from_array(ndarray::array![[1.], [2.]]);
    assert!(matches!(
        join.range_between(&data, &other, 1.),
        Err(JoinError::DimensionMismatch { left: 2, right: 1 })
    ));
    assert!(join.counts().is_empty());
}
