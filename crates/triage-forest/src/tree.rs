//! CART decision trees stored as index-linked arenas.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::split::{find_best_split, gini};

/// A node in the tree arena. Children are referenced by arena index,
/// which keeps the tree cache-friendly and trivially serializable.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) enum Node {
    /// An interior decision node.
    Branch {
        /// Feature column tested at this node.
        feature: usize,
        /// Samples with `value <= threshold` go left.
        threshold: f64,
        /// Arena index of the left child.
        left: usize,
        /// Arena index of the right child.
        right: usize,
        /// Weighted impurity decrease contributed by this split.
        impurity_decrease: f64,
    },
    /// A terminal node.
    Leaf {
        /// Majority class of the training samples that reached this leaf.
        class: usize,
        /// Number of training samples in this leaf.
        n_samples: usize,
    },
}

/// Stopping and sampling parameters for growing a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
}

/// A fitted CART decision tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl Tree {
    /// Grow a tree on the given bootstrap sample.
    ///
    /// `columns` is the shared column-major training matrix
    /// (`columns[feature][sample]`); `samples` is the bootstrap draw,
    /// possibly with repeats. Labels are dense class indices. Inputs are
    /// validated by the forest before any tree is grown.
    pub(crate) fn grow(
        columns: &[Vec<f64>],
        labels: &[usize],
        samples: &[usize],
        n_classes: usize,
        params: TreeParams,
        seed: u64,
    ) -> Self {
        let mut builder = TreeBuilder {
            columns,
            labels,
            n_classes,
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
            arena: Vec::new(),
        };
        builder.build(samples, 0);
        Tree {
            nodes: builder.arena,
            n_features: columns.len(),
        }
    }

    /// Predict the class for one sample by walking from the root.
    ///
    /// The caller guarantees `sample.len()` equals the trained width.
    pub(crate) fn predict(&self, sample: &[f64]) -> usize {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class, .. } => return *class,
                Node::Branch {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Mean Decrease in Impurity importances, normalized to sum to 1.0.
    ///
    /// All zeros when the tree is a single leaf.
    pub(crate) fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Branch {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[*feature] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Total node count (branches and leaves).
    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum depth; a root-only tree has depth 0.
    pub(crate) fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Branch { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        max_depth
    }
}

/// Recursive arena builder for a single tree.
struct TreeBuilder<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Build the subtree for `samples` and return its arena index.
    fn build(&mut self, samples: &[usize], depth: usize) -> usize {
        let n_samples = samples.len();
        let mut class_counts = vec![0usize; self.n_classes];
        for &s in samples {
            class_counts[self.labels[s]] += 1;
        }

        let pure = gini(&class_counts, n_samples) == 0.0;
        let depth_capped = self.params.max_depth.is_some_and(|max| depth >= max);
        let too_few = n_samples < self.params.min_samples_split;

        if pure || depth_capped || too_few {
            return self.push_leaf(&class_counts, n_samples);
        }

        let Some(split) = find_best_split(
            self.columns,
            self.labels,
            samples,
            self.n_classes,
            self.params.max_features,
            self.params.min_samples_leaf,
            &mut self.rng,
        ) else {
            return self.push_leaf(&class_counts, n_samples);
        };

        // Reserve the branch slot first so children land after it; the
        // placeholder is overwritten once both subtrees exist.
        let idx = self.arena.len();
        self.arena.push(Node::Leaf {
            class: 0,
            n_samples,
        });

        let left = self.build(&split.left, depth + 1);
        let right = self.build(&split.right, depth + 1);

        self.arena[idx] = Node::Branch {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity_decrease: split.impurity_decrease,
        };
        idx
    }

    /// Append a leaf predicting the majority class (lowest index on ties).
    fn push_leaf(&mut self, class_counts: &[usize], n_samples: usize) -> usize {
        let mut class = 0usize;
        let mut best = 0usize;
        for (c, &count) in class_counts.iter().enumerate() {
            if count > best {
                best = count;
                class = c;
            }
        }
        let idx = self.arena.len();
        self.arena.push(Node::Leaf { class, n_samples });
        idx
    }
}
