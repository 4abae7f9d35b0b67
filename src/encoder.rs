use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ApplicationRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericStats {
    pub field: String,
    pub mean: f64,
    pub stddev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryVocab {
    pub field: String,
    pub values: Vec<String>,
}

/// Frozen encoding parameters fitted on a historical corpus. The field order
/// baked into `numeric` and `categorical` is part of the artifact contract:
/// every vector in the index was produced with it, so it must be persisted
/// and reloaded unchanged at both ingestion and query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedEncoder {
    numeric: Vec<NumericStats>,
    categorical: Vec<CategoryVocab>,
}

/// Compute standardization statistics and categorical vocabularies over the
/// corpus. Vocabularies are sorted so fitting is independent of row order.
pub fn fit(corpus: &[ApplicationRecord]) -> Result<FittedEncoder> {
    if corpus.is_empty() {
        return Err(Error::Schema(
            "cannot fit encoder on an empty corpus".to_string(),
        ));
    }

    let count = corpus.len() as f64;
    let mut numeric = Vec::with_capacity(NUMERIC_FIELDS.len());

    for (idx, field) in NUMERIC_FIELDS.iter().enumerate() {
        let values: Vec<f64> = corpus
            .iter()
            .map(|record| record.numeric_values()[idx])
            .collect();
        let mean = values.iter().sum::<f64>() / count;
        let variance = values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / count;
        numeric.push(NumericStats {
            field: field.to_string(),
            mean,
            stddev: variance.sqrt(),
        });
    }

    let mut categorical = Vec::with_capacity(CATEGORICAL_FIELDS.len());
    for (idx, field) in CATEGORICAL_FIELDS.iter().enumerate() {
        let observed: BTreeSet<String> = corpus
            .iter()
            .map(|record| record.categorical_values()[idx].to_string())
            .collect();
        categorical.push(CategoryVocab {
            field: field.to_string(),
            values: observed.into_iter().collect(),
        });
    }

    Ok(FittedEncoder {
        numeric,
        categorical,
    })
}

impl FittedEncoder {
    /// Fixed output length: one slot per numeric field plus one per fitted
    /// category value.
    pub fn dimension(&self) -> usize {
        let vocab_size: usize = self.categorical.iter().map(|vocab| vocab.values.len()).sum();
        self.numeric.len() + vocab_size
    }

    /// Map a record to its feature vector: standardized numeric fields in
    /// declared order, then one-hot blocks per categorical field. Category
    /// values unseen at fit time produce an all-zero block.
    pub fn transform(&self, record: &ApplicationRecord) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dimension());

        for (stats, value) in self.numeric.iter().zip(record.numeric_values()) {
            vector.push(standardize(value, stats.mean, stats.stddev) as f32);
        }

        for (vocab, value) in self.categorical.iter().zip(record.categorical_values()) {
            for known in &vocab.values {
                vector.push(if known.as_str() == value { 1.0 } else { 0.0 });
            }
        }

        vector
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| Error::Artifact(format!("failed to serialize encoder: {err}")))?;
        std::fs::write(path, json).map_err(|err| {
            Error::Artifact(format!("failed to write {}: {err}", path.display()))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|err| {
            Error::Artifact(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&json)
            .map_err(|err| Error::Artifact(format!("invalid encoder artifact: {err}")))
    }
}

fn standardize(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev == 0.0 {
        0.0
    } else {
        (value - mean) / stddev
    }
}
