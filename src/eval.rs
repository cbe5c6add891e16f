//! Scoring of outlier flags against ground-truth labels.

use crate::{Label, Scalar};

/// Area under the ROC curve of ```scores``` (higher means more likely positive) against
/// ```truth```.
///
/// Computed as the normalised Mann-Whitney U statistic, ties sharing their average rank.
/// Returns ```None``` if the slices differ in length or either class is absent.
pub fn roc_auc(truth: &[bool], scores: &[Scalar]) -> Option<Scalar> {
    if truth.len() != scores.len() {
        return None;
    }

    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }

        // 1-based ranks start+1 ..= end share their mean.
        let rank = (start + 1 + end) as Scalar / 2.;
        rank_sum += rank * order[start..end].iter().filter(|&&i| truth[i]).count() as Scalar;
        start = end;
    }

    let p = positives as Scalar;
    let u = rank_sum - p * (p + 1.) / 2.;
    Some(u / (p * negatives as Scalar))
}

/// Turns optional labels into ground truth: ```true``` where the label equals ```positive```.
pub fn truth_from_labels(labels: &[Option<Label>], positive: Label) -> Vec<bool> {
    labels.iter().map(|&l| l == Some(positive)).collect()
}

/// Scores for [`roc_auc`] from outlier flags: ```1``` for outliers, ```0``` otherwise.
pub fn flag_scores(flags: &[bool]) -> Vec<Scalar> {
    flags.iter().map(|&f| if f { 1. } else { 0. }).collect()
}
