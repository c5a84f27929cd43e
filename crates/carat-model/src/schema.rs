//! Training-time feature schema and column alignment

use carat_core::{Error, Result};
use std::collections::HashMap;

/// Columns produced by the training job.
///
/// Numerics first in dataset order, then `get_dummies(drop_first=True)`
/// output: one column per category except the alphabetically first one
/// (`cut_Fair`, `color_D`, `clarity_I1` are the implicit baselines).
pub const DIAMOND_TRAINING_COLUMNS: [&str; 23] = [
    "carat",
    "depth",
    "table",
    "x",
    "y",
    "z",
    "cut_Good",
    "cut_Ideal",
    "cut_Premium",
    "cut_Very Good",
    "color_E",
    "color_F",
    "color_G",
    "color_H",
    "color_I",
    "color_J",
    "clarity_IF",
    "clarity_SI1",
    "clarity_SI2",
    "clarity_VS1",
    "clarity_VS2",
    "clarity_VVS1",
    "clarity_VVS2",
];

/// Ordered list of the feature names a model was fit on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty, blank or duplicate column names
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::model_load("feature schema has no columns"));
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(Error::model_load(format!(
                    "feature schema column {} has an empty name",
                    i
                )));
            }
            if positions.insert(column.clone(), i).is_some() {
                return Err(Error::model_load(format!(
                    "feature schema lists column '{}' twice",
                    column
                )));
            }
        }

        Ok(Self { columns, positions })
    }

    /// The schema the diamond training job produces
    pub fn diamonds() -> Self {
        let columns: Vec<String> = DIAMOND_TRAINING_COLUMNS.iter().map(|c| c.to_string()).collect();
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { columns, positions }
    }

    /// Parse a `training_columns.json` artifact (a JSON array of strings)
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let columns: Vec<String> = serde_json::from_slice(bytes)
            .map_err(|e| Error::model_load(format!("invalid training columns artifact: {}", e)))?;
        Self::new(columns)
    }

    /// Column names, in model order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column in the model input
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::diamonds()
    }
}

/// Align named values to `schema`.
///
/// Columns the schema expects but `values` lacks are zero; names the
/// schema does not know are dropped. If a name repeats, the last value wins.
pub fn reindex<'a, I>(values: I, schema: &FeatureSchema) -> Vec<f64>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut row = vec![0.0; schema.len()];
    for (name, value) in values {
        if let Some(i) = schema.position(name) {
            row[i] = value;
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(cols: &[&str]) -> FeatureSchema {
        FeatureSchema::new(cols.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_diamond_schema_layout() {
        let schema = FeatureSchema::diamonds();
        assert_eq!(schema.len(), 23);
        assert_eq!(schema.position("carat"), Some(0));
        assert_eq!(schema.position("cut_Very Good"), Some(9));
        assert_eq!(schema.position("clarity_VVS2"), Some(22));
        // drop_first baselines are not model inputs
        assert!(!schema.contains("cut_Fair"));
        assert!(!schema.contains("color_D"));
        assert!(!schema.contains("clarity_I1"));
    }

    #[test]
    fn test_reindex_zero_fills_missing_columns() {
        let schema = schema(&["a", "b", "c"]);
        let row = reindex([("c", 3.0), ("a", 1.0)], &schema);
        assert_eq!(row, vec![1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_reindex_drops_unexpected_columns() {
        let schema = schema(&["a", "b"]);
        let row = reindex([("a", 1.0), ("price", 326.0), ("b", 2.0)], &schema);
        assert_eq!(row, vec![1.0, 2.0]);
    }

    #[test]
    fn test_reindex_follows_schema_order() {
        let schema = schema(&["z", "y", "x"]);
        let row = reindex([("x", 1.0), ("y", 2.0), ("z", 3.0)], &schema);
        assert_eq!(row, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let err = FeatureSchema::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert!(err.to_string().contains("'a' twice"));
    }

    #[test]
    fn test_rejects_empty_schema() {
        assert!(FeatureSchema::new(Vec::new()).is_err());
        assert!(FeatureSchema::new(vec!["a".into(), " ".into()]).is_err());
    }

    #[test]
    fn test_from_json() {
        let schema = FeatureSchema::from_json(br#"["carat", "cut_Ideal"]"#).unwrap();
        assert_eq!(schema.columns(), &["carat".to_string(), "cut_Ideal".to_string()]);

        assert!(FeatureSchema::from_json(b"{\"carat\": 0}").is_err());
    }
}
