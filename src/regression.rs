//! Pre-trained AQI regression model
//!
//! The model is consumed as a black box through [`AqiModel`]: one scalar
//! prediction per fixed-width input row. The concrete [`RegressionModel`] is
//! loaded once at startup from a JSON artifact describing either a linear
//! model or a random forest of regression trees.

use ndarray::{ArrayView1, ArrayView2};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors raised while loading or invoking the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("expected {expected} input features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("model returned no prediction")]
    EmptyOutput,

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
}

/// Regression contract: `predict(rows)` yields one value per row.
pub trait AqiModel: Send + Sync {
    /// Number of features every input row must carry
    fn input_width(&self) -> usize;

    /// `rows` is a `(samples, input_width)` feature matrix
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError>;
}

/// Serialized model description
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear {
        input_width: usize,
        weights: Vec<f64>,
        intercept: f64,
    },
    RandomForest {
        input_width: usize,
        trees: Vec<RegressionTree>,
    },
}

/// Binary regression tree stored as a flat node list, root at index 0
#[derive(Debug, Clone, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `row[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

impl RegressionTree {
    fn validate(&self, input_width: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidArtifact("tree without nodes".into()));
        }
        for node in &self.nodes {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= input_width {
                    return Err(ModelError::InvalidArtifact(format!(
                        "split on feature {feature} beyond input width {input_width}"
                    )));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(ModelError::InvalidArtifact(
                        "split points outside of the node list".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, row: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        Err(ModelError::InvalidArtifact("tree contains a cycle".into()))
    }
}

impl ModelArtifact {
    /// Parse an artifact; structural checks happen in [`RegressionModel::new`]
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::InvalidArtifact(e.to_string()))
    }

    #[must_use]
    pub fn input_width(&self) -> usize {
        match self {
            ModelArtifact::Linear { input_width, .. }
            | ModelArtifact::RandomForest { input_width, .. } => *input_width,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            ModelArtifact::Linear {
                input_width,
                weights,
                ..
            } => {
                if weights.len() != *input_width {
                    return Err(ModelError::InvalidArtifact(format!(
                        "{} weights for input width {input_width}",
                        weights.len()
                    )));
                }
            }
            ModelArtifact::RandomForest { input_width, trees } => {
                if trees.is_empty() {
                    return Err(ModelError::InvalidArtifact("forest without trees".into()));
                }
                for tree in trees {
                    tree.validate(*input_width)?;
                }
            }
        }
        Ok(())
    }
}

/// Model backed by a validated [`ModelArtifact`]
#[derive(Debug, Clone)]
pub struct RegressionModel {
    artifact: ModelArtifact,
}

impl RegressionModel {
    pub fn new(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        match &self.artifact {
            ModelArtifact::Linear {
                weights, intercept, ..
            } => Ok(weights.iter().zip(row.iter()).map(|(w, x)| w * x).sum::<f64>() + intercept),
            ModelArtifact::RandomForest { trees, .. } => {
                let mut total = 0.0;
                for tree in trees {
                    total += tree.evaluate(row)?;
                }
                Ok(total / trees.len() as f64)
            }
        }
    }
}

impl AqiModel for RegressionModel {
    fn input_width(&self) -> usize {
        self.artifact.input_width()
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
        let expected = self.input_width();
        if rows.ncols() != expected {
            return Err(ModelError::WidthMismatch {
                expected,
                actual: rows.ncols(),
            });
        }
        rows.outer_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Load the model artifact at `path`, checking it against the configured input width
#[instrument]
pub fn load_model(path: &Path, expected_width: usize) -> crate::Result<Arc<dyn AqiModel>> {
    let json = std::fs::read_to_string(path)?;
    let artifact = ModelArtifact::from_json(&json)?;
    if artifact.input_width() != expected_width {
        return Err(ModelError::WidthMismatch {
            expected: expected_width,
            actual: artifact.input_width(),
        }
        .into());
    }

    info!(
        "Loaded AQI model from {} (input width {})",
        path.display(),
        expected_width
    );
    Ok(Arc::new(RegressionModel::new(artifact)?))
}
