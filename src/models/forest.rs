//! Pretrained regression forest for instantaneous health.
//!
//! An ensemble of binary regression trees exported from the offline training
//! job. A row descends each tree (`x[feature] <= threshold` goes left) to a
//! leaf; the forest prediction is the mean leaf value across trees. Rows are
//! evaluated in parallel with rayon; output order matches input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::InstantHealthModel;
use crate::error::InferenceError;
use crate::types::FeatureMatrix;

const MODEL_NAME: &str = "instant health forest";

/// One node of a regression tree. Children are indices into the tree's node
/// list and always point forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk from the root to a leaf. Validated trees always terminate because
    /// child indices strictly increase.
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {i} has non-finite value"));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {i} splits on feature {feature}, model has {n_features}"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {i} has NaN threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child index {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Mean-of-trees regression ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl ForestRegressor {
    /// Check every tree against the declared feature count.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("forest declares zero features".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }

    /// Total node count across all trees.
    pub fn num_nodes(&self) -> usize {
        self.trees.iter().map(|t| t.nodes.len()).sum()
    }
}

impl InstantHealthModel for ForestRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        let dimension_error = |found| InferenceError::FeatureDimension {
            model: MODEL_NAME,
            expected: self.n_features,
            found,
        };
        if x.n_cols() != self.n_features {
            return Err(dimension_error(x.n_cols()));
        }
        if let Some(row) = x.rows.iter().find(|r| r.len() != self.n_features) {
            return Err(dimension_error(row.len()));
        }

        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        let preds: Vec<f64> = x
            .rows
            .par_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect();

        if let Some(index) = preds.iter().position(|p| !p.is_finite()) {
            return Err(InferenceError::NonFinite {
                model: MODEL_NAME,
                index,
            });
        }
        Ok(preds)
    }
}
