//! Regressor trait and the estimators the training job can export

use crate::preprocess::FeatureBatch;
use carat_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Trait for all regression models
pub trait Regressor: Send + Sync {
    /// Predict one value per row of `batch`
    fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>>;

    /// Number of input features the model was fit on
    fn n_features(&self) -> usize;

    /// Estimator family name
    fn name(&self) -> &str;
}

fn check_width(expected: usize, batch: &FeatureBatch) -> Result<()> {
    if batch.n_features() != expected {
        return Err(Error::inference(format!(
            "model expects {} features, batch has {}",
            expected,
            batch.n_features()
        )));
    }
    Ok(())
}

/// A node of a fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal node: go `left` when `x[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node
    Leaf { value: f64 },
}

/// A decision tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Validate and build a tree.
    ///
    /// Children must point forward (index greater than the parent), so
    /// every walk from the root ends at a leaf.
    pub fn new(nodes: Vec<TreeNode>, n_features: usize) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::model_load("decision tree has no nodes"));
        }

        for (i, node) in nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(Error::model_load(format!(
                            "node {} splits on feature {} but the model has {} features",
                            i, feature, n_features
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(Error::model_load(format!("node {} has a NaN threshold", i)));
                    }
                    for child in [left, right] {
                        if child <= i || child >= nodes.len() {
                            return Err(Error::model_load(format!(
                                "node {} has invalid child index {}",
                                i, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(Error::model_load(format!(
                            "leaf {} has a non-finite value",
                            i
                        )));
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    /// Walk the tree for one row. `row` must have at least `n_features` entries.
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Random forest regressor: the mean of its trees
#[derive(Debug, Clone)]
pub struct ForestRegressor {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl ForestRegressor {
    pub fn new(trees: Vec<DecisionTree>, n_features: usize) -> Result<Self> {
        if trees.is_empty() {
            return Err(Error::model_load("random forest has no trees"));
        }
        if n_features == 0 {
            return Err(Error::model_load("random forest has zero features"));
        }
        Ok(Self { trees, n_features })
    }
}

impl Regressor for ForestRegressor {
    fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>> {
        check_width(self.n_features, batch)?;

        let n_trees = self.trees.len() as f64;
        Ok(batch
            .rows()
            .map(|row| self.trees.iter().map(|t| t.evaluate(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

/// Linear regressor: `intercept + coefficients · x`
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(Error::model_load("linear model has no coefficients"));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(Error::model_load("linear model has non-finite parameters"));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>> {
        check_width(self.coefficients.len(), batch)?;

        Ok(batch
            .rows()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, c)| x * c)
                        .sum::<f64>()
            })
            .collect())
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn name(&self) -> &str {
        "linear"
    }
}
