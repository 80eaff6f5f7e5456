// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Weight regression from food features
//!
//! The bundled regressor is a gradient-boosted tree ensemble saved in the
//! XGBoost JSON model format. Prediction sums the leaf values of every tree
//! onto the base margin and applies the objective's link function.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::features::FeatureVector;

#[derive(Debug, Error)]
pub enum RegressorError {
    #[error("Failed to read regressor model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse regressor model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid regressor model: {0}")]
    InvalidModel(String),

    #[error("Feature '{0}' required by the regressor is missing")]
    MissingFeature(String),

    #[error("Regressor expects {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
}

/// Maps a feature vector to an estimated weight in grams
#[cfg_attr(test, mockall::automock)]
pub trait WeightRegressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RegressorError>;
}

// XGBoost JSON layout (only the fields prediction needs)

#[derive(Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveJson,
}

#[derive(Deserialize)]
struct GradientBooster {
    name: String,
    model: Option<GbTreeModel>,
}

#[derive(Deserialize)]
struct GbTreeModel {
    trees: Vec<TreeJson>,
}

#[derive(Deserialize)]
struct TreeJson {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    #[serde(default)]
    default_left: Vec<Flag>,
}

/// `default_left` is written as 0/1 by some versions and booleans by others
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Deserialize)]
struct ObjectiveJson {
    name: String,
}

/// Output link of the training objective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Identity,
    Exp,
    Logistic,
}

impl Link {
    pub fn for_objective(objective: &str) -> Self {
        match objective {
            "reg:gamma" | "reg:tweedie" | "count:poisson" => Link::Exp,
            "reg:logistic" | "binary:logistic" => Link::Logistic,
            _ => Link::Identity,
        }
    }

    fn to_margin(self, value: f64) -> f64 {
        match self {
            Link::Identity => value,
            Link::Exp => value.ln(),
            Link::Logistic => (value / (1.0 - value)).ln(),
        }
    }

    fn apply(self, margin: f64) -> f64 {
        match self {
            Link::Identity => margin,
            Link::Exp => margin.exp(),
            Link::Logistic => 1.0 / (1.0 + (-margin).exp()),
        }
    }
}

#[derive(Debug, Clone)]
struct Tree {
    left: Vec<usize>,
    right: Vec<usize>,
    is_leaf: Vec<bool>,
    feature: Vec<usize>,
    threshold: Vec<f64>,
    default_left: Vec<bool>,
}

impl Tree {
    fn from_json(idx: usize, json: TreeJson) -> Result<Self, RegressorError> {
        let n = json.left_children.len();
        let lengths_match = json.right_children.len() == n
            && json.split_indices.len() == n
            && json.split_conditions.len() == n
            && (json.default_left.is_empty() || json.default_left.len() == n);
        if n == 0 || !lengths_match {
            return Err(RegressorError::InvalidModel(format!(
                "tree {} has inconsistent node arrays",
                idx
            )));
        }

        let mut tree = Tree {
            left: vec![0; n],
            right: vec![0; n],
            is_leaf: vec![false; n],
            feature: vec![0; n],
            threshold: json.split_conditions,
            default_left: if json.default_left.is_empty() {
                vec![false; n]
            } else {
                json.default_left.iter().map(Flag::is_set).collect()
            },
        };

        for node in 0..n {
            let (l, r) = (json.left_children[node], json.right_children[node]);
            if l == -1 {
                tree.is_leaf[node] = true;
                continue;
            }
            // Children always follow their parent, which also rules out cycles
            let in_range = |c: i64| c > node as i64 && (c as usize) < n;
            if !in_range(l) || !in_range(r) || json.split_indices[node] < 0 {
                return Err(RegressorError::InvalidModel(format!(
                    "tree {} node {} has invalid children or split index",
                    idx, node
                )));
            }
            tree.left[node] = l as usize;
            tree.right[node] = r as usize;
            tree.feature[node] = json.split_indices[node] as usize;
        }

        Ok(tree)
    }

    fn max_feature(&self) -> Option<usize> {
        (0..self.left.len())
            .filter(|&i| !self.is_leaf[i])
            .map(|i| self.feature[i])
            .max()
    }

    /// Leaf value for a row; missing values follow the default branch
    fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        while !self.is_leaf[node] {
            let value = row[self.feature[node]];
            node = if value.is_nan() {
                if self.default_left[node] {
                    self.left[node]
                } else {
                    self.right[node]
                }
            } else if value < self.threshold[node] {
                self.left[node]
            } else {
                self.right[node]
            };
        }
        self.threshold[node]
    }
}

/// Gradient-boosted tree ensemble loaded from XGBoost JSON
#[derive(Debug, Clone)]
pub struct XgboostRegressor {
    trees: Vec<Tree>,
    base_margin: f64,
    link: Link,
    feature_names: Option<Vec<String>>,
    num_features: usize,
}

impl XgboostRegressor {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegressorError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RegressorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_json_str(&json)?;
        info!(
            "Loaded weight regressor from {} ({} trees, {} features)",
            path.display(),
            model.num_trees(),
            model.num_features
        );
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegressorError> {
        let file: ModelFile = serde_json::from_str(json)?;
        let learner = file.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(RegressorError::InvalidModel(format!(
                "unsupported booster '{}'",
                learner.gradient_booster.name
            )));
        }
        let trees_json = learner
            .gradient_booster
            .model
            .ok_or_else(|| RegressorError::InvalidModel("missing tree model".to_string()))?
            .trees;

        let trees = trees_json
            .into_iter()
            .enumerate()
            .map(|(idx, t)| Tree::from_json(idx, t))
            .collect::<Result<Vec<_>, _>>()?;

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let link = Link::for_objective(&learner.objective.name);

        let used = trees.iter().filter_map(Tree::max_feature).max().map_or(0, |m| m + 1);
        let declared = learner
            .learner_model_param
            .num_feature
            .as_deref()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        let feature_names = (!learner.feature_names.is_empty()).then_some(learner.feature_names);
        let num_features = used
            .max(declared)
            .max(feature_names.as_ref().map_or(0, Vec::len));

        if let Some(names) = &feature_names {
            if names.len() < used {
                return Err(RegressorError::InvalidModel(format!(
                    "{} feature names but splits reference feature {}",
                    names.len(),
                    used - 1
                )));
            }
        }

        Ok(Self {
            trees,
            base_margin: link.to_margin(base_score),
            link,
            feature_names,
            num_features,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Arrange the input in model column order
    fn row(&self, features: &FeatureVector) -> Result<Vec<f64>, RegressorError> {
        match &self.feature_names {
            Some(names) => names
                .iter()
                .map(|name| {
                    features
                        .get(name)
                        .ok_or_else(|| RegressorError::MissingFeature(name.clone()))
                })
                .collect(),
            None => {
                if features.len() < self.num_features {
                    return Err(RegressorError::FeatureCount {
                        expected: self.num_features,
                        actual: features.len(),
                    });
                }
                Ok(features.values().to_vec())
            }
        }
    }
}

impl WeightRegressor for XgboostRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RegressorError> {
        let row = self.row(features)?;
        let margin = self.base_margin + self.trees.iter().map(|t| t.leaf_value(&row)).sum::<f64>();
        let prediction = self.link.apply(margin);
        debug!("Regressor margin {:.4} -> {:.4}", margin, prediction);
        Ok(prediction)
    }
}

/// `base_score` is a string, either `"5E-1"` or `"[5E-1]"` depending on version
fn parse_base_score(raw: &str) -> Result<f64, RegressorError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or_default().trim();
    first
        .parse::<f64>()
        .map_err(|_| RegressorError::InvalidModel(format!("invalid base_score '{}'", raw)))
}
