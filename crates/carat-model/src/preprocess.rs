//! Request parsing and one-hot encoding of diamond records

use crate::schema::{reindex, FeatureSchema};
use carat_core::{Clarity, Color, Cut, DiamondRecord, Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Parse a prediction request body into diamond records.
///
/// The body must be a non-empty JSON array of at most `max_batch_size`
/// objects, each carrying all nine diamond fields. Keys outside the
/// schema are ignored.
pub fn parse_records(body: &[u8], max_batch_size: usize) -> Result<Vec<DiamondRecord>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::schema(format!("request body is not valid JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::schema(format!(
                "expected a JSON array of diamond records, got {}",
                json_type(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(Error::schema("expected at least one diamond record"));
    }
    if items.len() > max_batch_size {
        return Err(Error::schema(format!(
            "batch of {} records exceeds the limit of {}",
            items.len(),
            max_batch_size
        )));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_record(i, item))
        .collect()
}

fn parse_record(index: usize, value: &Value) -> Result<DiamondRecord> {
    let obj = value.as_object().ok_or_else(|| {
        Error::schema(format!(
            "record {}: expected an object, got {}",
            index,
            json_type(value)
        ))
    })?;

    Ok(DiamondRecord {
        carat: number(index, obj, "carat")?,
        cut: grade(index, obj, Cut::FIELD)?,
        color: grade(index, obj, Color::FIELD)?,
        clarity: grade(index, obj, Clarity::FIELD)?,
        depth: number(index, obj, "depth")?,
        table: number(index, obj, "table")?,
        x: number(index, obj, "x")?,
        y: number(index, obj, "y")?,
        z: number(index, obj, "z")?,
    })
}

fn number(index: usize, obj: &Map<String, Value>, field: &str) -> Result<f64> {
    match obj.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            Error::schema(format!("record {}: field '{}' is out of range", index, field))
        }),
        Some(other) => Err(Error::schema(format!(
            "record {}: field '{}' must be a number, got {}",
            index,
            field,
            json_type(other)
        ))),
        None => Err(missing(index, field)),
    }
}

fn grade<G>(index: usize, obj: &Map<String, Value>, field: &str) -> Result<G>
where
    G: std::str::FromStr<Err = Error>,
{
    match obj.get(field) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e: Error| Error::schema(format!("record {}: {}", index, strip_prefix(&e)))),
        Some(other) => Err(Error::schema(format!(
            "record {}: field '{}' must be a string, got {}",
            index,
            field,
            json_type(other)
        ))),
        None => Err(missing(index, field)),
    }
}

fn missing(index: usize, field: &str) -> Error {
    Error::schema(format!("record {}: missing required field '{}'", index, field))
}

fn strip_prefix(err: &Error) -> String {
    match err {
        Error::Schema(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A record expanded into named numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    values: Vec<(String, f64)>,
}

impl EncodedRow {
    /// Named values, numerics first, then every category of each grade
    pub fn values(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, v)| (name.as_str(), *v))
    }

    /// Value of a named column, if the encoding produced it
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One-hot encode a record against the full category domains.
///
/// Every category gets a column (`cut_Fair` included); alignment to what
/// the model was actually trained on is [`reindex`]'s job.
pub fn encode(record: &DiamondRecord) -> EncodedRow {
    let mut values =
        Vec::with_capacity(6 + Cut::ALL.len() + Color::ALL.len() + Clarity::ALL.len());

    for (name, v) in record.numeric_values() {
        values.push((name.to_string(), v));
    }
    for cut in Cut::ALL {
        values.push((cut.column(), one_hot(*cut == record.cut)));
    }
    for color in Color::ALL {
        values.push((color.column(), one_hot(*color == record.color)));
    }
    for clarity in Clarity::ALL {
        values.push((clarity.column(), one_hot(*clarity == record.clarity)));
    }

    EncodedRow { values }
}

fn one_hot(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

/// Row-major matrix of model inputs
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    n_features: usize,
    values: Vec<f64>,
}

impl FeatureBatch {
    /// Build a batch from rows that all have `n_features` columns
    pub fn from_rows(n_features: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        let mut values = Vec::with_capacity(n_features * rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_features {
                return Err(Error::inference(format!(
                    "row {} has {} features, expected {}",
                    i,
                    row.len(),
                    n_features
                )));
            }
            values.extend(row);
        }
        Ok(Self { n_features, values })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_rows(&self) -> usize {
        if self.n_features == 0 {
            0
        } else {
            self.values.len() / self.n_features
        }
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.n_features)?;
        self.values.get(start..start + self.n_features)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.n_features.max(1))
    }
}

/// Turns diamond records into model input aligned to a training schema
#[derive(Debug, Clone)]
pub struct Preprocessor {
    schema: Arc<FeatureSchema>,
}

impl Preprocessor {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode and align a single record
    pub fn transform_one(&self, record: &DiamondRecord) -> Vec<f64> {
        let encoded = encode(record);
        reindex(encoded.values(), &self.schema)
    }

    /// Encode and align a batch, preserving record order
    pub fn transform(&self, records: &[DiamondRecord]) -> FeatureBatch {
        let n_features = self.schema.len();
        let mut values = Vec::with_capacity(n_features * records.len());
        for record in records {
            values.extend(self.transform_one(record));
        }
        FeatureBatch { n_features, values }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(Arc::new(FeatureSchema::diamonds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn example() -> Value {
        json!({
            "carat": 1.0, "cut": "Ideal", "color": "H", "clarity": "SI1",
            "depth": 61.5, "table": 55.0, "x": 6.3, "y": 6.54, "z": 4.0
        })
    }

    fn body(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn test_parse_example_record() {
        let records = parse_records(&body(json!([example()])), 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cut, Cut::Ideal);
        assert_eq!(records[0].clarity, Clarity::Si1);
        assert_eq!(records[0].y, 6.54);
    }

    #[test]
    fn test_parse_accepts_integer_numbers() {
        let mut record = example();
        record["table"] = json!(55);
        let records = parse_records(&body(json!([record])), 10).unwrap();
        assert_eq!(records[0].table, 55.0);
    }

    #[test]
    fn test_parse_ignores_extra_keys() {
        let mut record = example();
        record["price"] = json!(326);
        assert!(parse_records(&body(json!([record])), 10).is_ok());
    }

    #[test]
    fn test_missing_numeric_field() {
        let mut record = example();
        record.as_object_mut().unwrap().remove("depth");
        let err = parse_records(&body(json!([example(), record])), 10).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("record 1: missing required field 'depth'"));
    }

    #[test]
    fn test_non_numeric_field() {
        let mut record = example();
        record["carat"] = json!("1.0");
        let err = parse_records(&body(json!([record])), 10).unwrap_err();
        assert!(err.to_string().contains("field 'carat' must be a number, got string"));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let mut record = example();
        record["cut"] = json!("Unknown");
        let err = parse_records(&body(json!([record])), 10).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("record 0: unknown cut 'Unknown'"));
    }

    #[test]
    fn test_body_shape_errors() {
        assert!(parse_records(b"not json", 10).is_err());
        assert!(parse_records(&body(example()), 10)
            .unwrap_err()
            .to_string()
            .contains("got object"));
        assert!(parse_records(&body(json!([])), 10)
            .unwrap_err()
            .to_string()
            .contains("at least one"));
        assert!(parse_records(&body(json!([1])), 10)
            .unwrap_err()
            .to_string()
            .contains("record 0: expected an object, got number"));
    }

    #[test]
    fn test_batch_limit() {
        let batch = json!([example(), example(), example()]);
        let err = parse_records(&body(batch), 2).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit of 2"));
    }

    #[test]
    fn test_encode_one_hot() {
        let records = parse_records(&body(json!([example()])), 1).unwrap();
        let row = encode(&records[0]);

        assert_eq!(row.len(), 6 + 5 + 7 + 8);
        assert_eq!(row.get("carat"), Some(1.0));
        assert_eq!(row.get("cut_Ideal"), Some(1.0));
        assert_eq!(row.get("cut_Premium"), Some(0.0));
        assert_eq!(row.get("color_H"), Some(1.0));
        assert_eq!(row.get("clarity_SI1"), Some(1.0));

        let hot: f64 = row
            .values()
            .filter(|(name, _)| name.starts_with("cut_"))
            .map(|(_, v)| v)
            .sum();
        assert_eq!(hot, 1.0);
    }

    #[test]
    fn test_transform_aligns_to_training_schema() {
        let records = parse_records(&body(json!([example()])), 1).unwrap();
        let pre = Preprocessor::default();
        let batch = pre.transform(&records);

        assert_eq!(batch.n_rows(), 1);
        assert_eq!(batch.n_features(), 23);
        let row = batch.row(0).unwrap();
        let schema = pre.schema();
        assert_eq!(row[schema.position("carat").unwrap()], 1.0);
        assert_eq!(row[schema.position("cut_Ideal").unwrap()], 1.0);
        assert_eq!(row[schema.position("color_H").unwrap()], 1.0);
        assert_eq!(row[schema.position("clarity_SI1").unwrap()], 1.0);
        assert_eq!(row.iter().filter(|v| **v == 1.0).count(), 4);
    }

    #[test]
    fn test_baseline_categories_encode_to_zero_columns() {
        let mut record = example();
        record["cut"] = json!("Fair");
        record["color"] = json!("D");
        record["clarity"] = json!("I1");
        let records = parse_records(&body(json!([record])), 1).unwrap();
        let row = Preprocessor::default().transform_one(&records[0]);
        assert!(row[6..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_feature_batch_rows() {
        let batch = FeatureBatch::from_rows(2, vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(batch.n_rows(), 2);
        assert_eq!(batch.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(batch.row(2), None);
        assert_eq!(batch.rows().count(), 2);

        assert!(FeatureBatch::from_rows(2, vec![vec![1.0]]).is_err());
    }

    fn arb_record() -> impl Strategy<Value = DiamondRecord> {
        (
            0.2f64..5.0,
            prop::sample::select(Cut::ALL.to_vec()),
            prop::sample::select(Color::ALL.to_vec()),
            prop::sample::select(Clarity::ALL.to_vec()),
            prop::array::uniform5(0.0f64..100.0),
        )
            .prop_map(|(carat, cut, color, clarity, dims)| DiamondRecord {
                carat,
                cut,
                color,
                clarity,
                depth: dims[0],
                table: dims[1],
                x: dims[2],
                y: dims[3],
                z: dims[4],
            })
    }

    proptest! {
        #[test]
        fn prop_transform_is_idempotent(record in arb_record()) {
            let pre = Preprocessor::default();
            prop_assert_eq!(pre.transform_one(&record), pre.transform_one(&record));
        }

        #[test]
        fn prop_batch_preserves_count_and_order(records in prop::collection::vec(arb_record(), 1..32)) {
            let pre = Preprocessor::default();
            let batch = pre.transform(&records);
            prop_assert_eq!(batch.n_rows(), records.len());
            for (i, record) in records.iter().enumerate() {
                prop_assert_eq!(batch.row(i).unwrap()[0], record.carat);
            }
        }
    }
}
