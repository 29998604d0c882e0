//! Gini impurity and exact best-split search.

use rand::Rng;
use rand::seq::index::sample;

/// Gini impurity of a node: `1 - Σ(p_i²)`.
///
/// Returns 0.0 for an empty node.
#[must_use]
pub fn gini(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// The best split found for a node.
#[derive(Debug)]
pub(crate) struct BestSplit {
    /// Feature column used for the split.
    pub(crate) feature: usize,
    /// Samples with `value <= threshold` go left.
    pub(crate) threshold: f64,
    /// Weighted impurity decrease from this split (MDI formula).
    pub(crate) impurity_decrease: f64,
    /// Sample indices for the left child.
    pub(crate) left: Vec<usize>,
    /// Sample indices for the right child.
    pub(crate) right: Vec<usize>,
}

/// Search a random feature subset for the split with the greatest weighted
/// impurity decrease.
///
/// `columns` is column-major: `columns[feature_idx][sample_idx]`. For each
/// candidate feature, the `(value, label)` pairs are sorted and scanned
/// left-to-right with incremental class counts; thresholds are midpoints
/// between adjacent distinct values. On the 0/1 indicator features this
/// pipeline produces, that reduces to a single 0.5 threshold per feature.
///
/// Returns `None` when no split is possible (constant candidate features,
/// or every boundary would violate `min_samples_leaf`).
pub(crate) fn find_best_split(
    columns: &[Vec<f64>],
    labels: &[usize],
    samples: &[usize],
    n_classes: usize,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<BestSplit> {
    let n_samples = samples.len();
    if n_samples < 2 || columns.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &s in samples {
        parent_counts[labels[s]] += 1;
    }
    let parent_impurity = gini(&parent_counts, n_samples);

    let candidates = sample(rng, columns.len(), max_features.min(columns.len()));

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, decrease)

    for feature in candidates {
        let column = &columns[feature];

        let mut order: Vec<usize> = samples.to_vec();
        order.sort_unstable_by(|&a, &b| column[a].total_cmp(&column[b]));

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for boundary in 1..n_samples {
            let prev = order[boundary - 1];
            left_counts[labels[prev]] += 1;
            right_counts[labels[prev]] -= 1;

            // Only a gap between distinct values is a valid boundary.
            let (lo, hi) = (column[prev], column[order[boundary]]);
            if lo == hi {
                continue;
            }

            let n_left = boundary;
            let n_right = n_samples - boundary;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            // Weighted impurity decrease, scikit-learn's MDI formula.
            let decrease = (n_samples as f64) * parent_impurity
                - (n_left as f64) * gini(&left_counts, n_left)
                - (n_right as f64) * gini(&right_counts, n_right);

            if best.is_none_or(|(_, _, d)| decrease > d) {
                best = Some((feature, (lo + hi) / 2.0, decrease));
            }
        }
    }

    let (feature, threshold, impurity_decrease) = best?;

    let column = &columns[feature];
    let mut left = Vec::with_capacity(n_samples / 2);
    let mut right = Vec::with_capacity(n_samples / 2);
    for &s in samples {
        if column[s] <= threshold {
            left.push(s);
        } else {
            right.push(s);
        }
    }

    Some(BestSplit {
        feature,
        threshold,
        impurity_decrease,
        left,
        right,
    })
}
