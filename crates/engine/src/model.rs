use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::CubeError;

/// Suffix that turns a dimension id into its label field name in flat records.
pub const LABEL_SUFFIX: &str = "_label";

/// Largest cube a sparse `value` object may expand to.
pub const MAX_SPARSE_CELLS: usize = 1 << 26;

// ---------------------------------------------------------------------------
// Input (JSON-stat 2.0 wire format)
// ---------------------------------------------------------------------------

/// One multi-dimensional statistical cube.
///
/// `value` is row-major over `id`: the first dimension varies slowest, the
/// last fastest. `size[i]` is the category count of dimension `id[i]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: Option<String>,
    pub source: Option<String>,
    pub updated: Option<String>,
    pub id: Vec<String>,
    pub size: Vec<usize>,
    pub dimension: HashMap<String, Dimension>,
    pub value: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dimension {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub index: Option<CategoryIndex>,
    #[serde(default)]
    pub label: HashMap<String, String>,
}

/// Category order, either listed directly or as code -> position.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryIndex {
    Ordered(Vec<String>),
    Positions(HashMap<String, usize>),
}

impl CategoryIndex {
    pub fn ordered_codes(&self) -> Vec<String> {
        match self {
            Self::Ordered(codes) => codes.clone(),
            Self::Positions(positions) => {
                let mut entries: Vec<(&String, usize)> =
                    positions.iter().map(|(code, pos)| (code, *pos)).collect();
                entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
                entries.into_iter().map(|(code, _)| code.clone()).collect()
            }
        }
    }
}

impl Category {
    /// Category codes in position order.
    ///
    /// JSON-stat allows `index` to be omitted when a dimension has a single
    /// category; the code then comes from the label map.
    pub fn ordered_codes(&self) -> Vec<String> {
        match &self.index {
            Some(index) => index.ordered_codes(),
            None => {
                let mut codes: Vec<String> = self.label.keys().cloned().collect();
                codes.sort();
                codes
            }
        }
    }

    /// Registered label for `code`, or the code itself.
    pub fn label_for<'a>(&'a self, code: &'a str) -> &'a str {
        self.label.get(code).map(String::as_str).unwrap_or(code)
    }
}

impl Dimension {
    /// Dimension with categories in the given order and no labels.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: None,
            category: Category {
                index: Some(CategoryIndex::Ordered(codes.into_iter().map(Into::into).collect())),
                label: HashMap::new(),
            },
        }
    }

    pub fn with_label(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.category.label.insert(code.into(), label.into());
        self
    }

    pub fn len(&self) -> usize {
        match &self.category.index {
            Some(CategoryIndex::Ordered(codes)) => codes.len(),
            Some(CategoryIndex::Positions(positions)) => positions.len(),
            None => self.category.label.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dataset {
    /// Empty cube over `value`; add axes with [`Dataset::with_dimension`].
    pub fn new(value: Vec<Option<f64>>) -> Self {
        Self {
            label: None,
            source: None,
            updated: None,
            id: Vec::new(),
            size: Vec::new(),
            dimension: HashMap::new(),
            value,
        }
    }

    /// Append a dimension as the new fastest-varying axis.
    pub fn with_dimension(mut self, id: impl Into<String>, dimension: Dimension) -> Self {
        let id = id.into();
        self.size.push(dimension.len());
        self.id.push(id.clone());
        self.dimension.insert(id, dimension);
        self
    }

    pub fn from_json(input: &str) -> Result<Self, CubeError> {
        let raw: RawDataset =
            serde_json::from_str(input).map_err(|e| CubeError::DatasetParse(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CubeError> {
        let raw: RawDataset =
            serde_json::from_reader(reader).map_err(|e| CubeError::DatasetParse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Number of cells in the cube (product of sizes; 1 for zero dimensions).
    /// Saturates at `usize::MAX`.
    pub fn cell_count(&self) -> usize {
        self.size.iter().fold(1usize, |acc, &n| acc.saturating_mul(n))
    }

    /// Number of non-missing observations.
    pub fn observation_count(&self) -> usize {
        self.value.iter().filter(|v| v.is_some()).count()
    }

    pub fn has_dimension(&self, id: &str) -> bool {
        self.id.iter().any(|d| d == id)
    }
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    id: Vec<String>,
    size: Vec<usize>,
    #[serde(default)]
    dimension: HashMap<String, Dimension>,
    value: RawValues,
}

/// Dense array with `null` gaps, or sparse `{ "flat index": value }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValues {
    Dense(Vec<Option<f64>>),
    Sparse(HashMap<String, Option<f64>>),
}

impl Dataset {
    fn from_raw(raw: RawDataset) -> Result<Self, CubeError> {
        if let Some(class) = raw.class {
            if class != "dataset" {
                return Err(CubeError::NotADataset(class));
            }
        }
        if raw.id.len() != raw.size.len() {
            return Err(CubeError::DatasetParse(format!(
                "id lists {} dimension(s) but size lists {}",
                raw.id.len(),
                raw.size.len()
            )));
        }

        let len = raw
            .size
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| CubeError::DatasetParse(format!("cube size {:?} overflows", raw.size)))?;

        let value = match raw.value {
            RawValues::Dense(values) => {
                if values.len() != len {
                    return Err(CubeError::DatasetParse(format!(
                        "value has {} entries but size implies {len} cells",
                        values.len()
                    )));
                }
                values
            }
            RawValues::Sparse(entries) => {
                if len > MAX_SPARSE_CELLS {
                    return Err(CubeError::DatasetParse(format!(
                        "sparse cube of {len} cells exceeds the limit of {MAX_SPARSE_CELLS}"
                    )));
                }
                let mut values = vec![None; len];
                for (key, v) in entries {
                    let index: usize = key.parse().map_err(|_| {
                        CubeError::DatasetParse(format!("sparse value key '{key}' is not an index"))
                    })?;
                    let slot = values.get_mut(index).ok_or_else(|| {
                        CubeError::DatasetParse(format!(
                            "sparse value index {index} out of range (cube has {len} cells)"
                        ))
                    })?;
                    *slot = v;
                }
                values
            }
        };

        Ok(Dataset {
            label: raw.label,
            source: raw.source,
            updated: raw.updated,
            id: raw.id,
            size: raw.size,
            dimension: raw.dimension,
            value,
        })
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Code and label of one dimension at one observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub code: String,
    pub label: String,
}

/// One decoded observation: a flat record of every dimension's code and
/// label plus the numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub value: f64,
    dimensions: Arc<[String]>,
    cells: Vec<Cell>,
}

impl Row {
    /// Build a row by hand from `(dimension, code)` pairs. Labels default to
    /// the code; override with [`Row::with_label`].
    pub fn new<I, D, C>(value: f64, fields: I) -> Self
    where
        I: IntoIterator<Item = (D, C)>,
        D: Into<String>,
        C: Into<String>,
    {
        let (dimensions, cells): (Vec<String>, Vec<Cell>) = fields
            .into_iter()
            .map(|(dim, code)| {
                let code = code.into();
                (dim.into(), Cell { label: code.clone(), code })
            })
            .unzip();
        Self {
            value,
            dimensions: dimensions.into(),
            cells,
        }
    }

    pub(crate) fn from_parts(value: f64, dimensions: Arc<[String]>, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(dimensions.len(), cells.len());
        Self {
            value,
            dimensions,
            cells,
        }
    }

    pub fn with_label(mut self, dimension: &str, label: impl Into<String>) -> Self {
        if let Some(i) = self.position(dimension) {
            self.cells[i].label = label.into();
        }
        self
    }

    fn position(&self, dimension: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == dimension)
    }

    /// Category code for `dimension`.
    pub fn code(&self, dimension: &str) -> Option<&str> {
        self.position(dimension).map(|i| self.cells[i].code.as_str())
    }

    /// Category label for `dimension`.
    pub fn label(&self, dimension: &str) -> Option<&str> {
        self.position(dimension).map(|i| self.cells[i].label.as_str())
    }

    /// Flat-record lookup: `dim` gives the code, `dim_label` the label.
    pub fn field(&self, name: &str) -> Option<&str> {
        if let Some(code) = self.code(name) {
            return Some(code);
        }
        name.strip_suffix(LABEL_SUFFIX).and_then(|dim| self.label(dim))
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.dimensions.iter().map(String::as_str).zip(self.cells.iter())
    }

    /// The row as a JSON object, same shape as its `Serialize` output.
    pub fn to_record(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut record = serde_json::Map::with_capacity(self.cells.len() * 2 + 1);
        for (dim, cell) in self.iter() {
            record.insert(dim.to_string(), cell.code.clone().into());
            record.insert(format!("{dim}{LABEL_SUFFIX}"), cell.label.clone().into());
        }
        let value = serde_json::Number::from_f64(self.value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
        record.insert("value".to_string(), value);
        record
    }
}

pub fn dimension_code<'a>(row: &'a Row, dimension: &str) -> Option<&'a str> {
    row.code(dimension)
}

pub fn dimension_label<'a>(row: &'a Row, dimension: &str) -> Option<&'a str> {
    row.label(dimension)
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len() * 2 + 1))?;
        for (dim, cell) in self.iter() {
            map.serialize_entry(dim, &cell.code)?;
            map.serialize_entry(&format!("{dim}{LABEL_SUFFIX}"), &cell.label)?;
        }
        map.serialize_entry("value", &self.value)?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_index_sorts_by_position() {
        let index = CategoryIndex::Positions(HashMap::from([
            ("2022".to_string(), 2),
            ("2020".to_string(), 0),
            ("2021".to_string(), 1),
        ]));
        assert_eq!(index.ordered_codes(), vec!["2020", "2021", "2022"]);
    }

    #[test]
    fn parse_dense_dataset() {
        let json = r#"{
            "version": "2.0",
            "class": "dataset",
            "label": "Output value",
            "id": ["TIME", "STAT"],
            "size": [2, 2],
            "dimension": {
                "TIME": { "category": { "index": ["2020", "2021"] } },
                "STAT": { "category": {
                    "index": { "Y": 1, "X": 0 },
                    "label": { "X": "Cattle" }
                } }
            },
            "value": [1, 2.5, 3, null]
        }"#;
        let ds = Dataset::from_json(json).unwrap();
        assert_eq!(ds.label.as_deref(), Some("Output value"));
        assert_eq!(ds.id, vec!["TIME", "STAT"]);
        assert_eq!(ds.size, vec![2, 2]);
        assert_eq!(ds.value, vec![Some(1.0), Some(2.5), Some(3.0), None]);
        assert_eq!(ds.dimension["STAT"].category.ordered_codes(), vec!["X", "Y"]);
        assert_eq!(ds.dimension["STAT"].category.label_for("X"), "Cattle");
        assert_eq!(ds.dimension["STAT"].category.label_for("Y"), "Y");
        assert_eq!(ds.observation_count(), 3);
    }

    #[test]
    fn parse_sparse_values() {
        let json = r#"{
            "id": ["A"],
            "size": [4],
            "dimension": { "A": { "category": { "index": ["a", "b", "c", "d"] } } },
            "value": { "1": 10, "3": 30 }
        }"#;
        let ds = Dataset::from_json(json).unwrap();
        assert_eq!(ds.value, vec![None, Some(10.0), None, Some(30.0)]);
    }

    #[test]
    fn sparse_index_out_of_range_is_rejected() {
        let json = r#"{
            "id": ["A"],
            "size": [2],
            "dimension": { "A": { "category": { "index": ["a", "b"] } } },
            "value": { "5": 1 }
        }"#;
        let err = Dataset::from_json(json).unwrap_err();
        assert!(matches!(err, CubeError::DatasetParse(ref msg) if msg.contains("out of range")));
    }

    #[test]
    fn overflowing_size_is_rejected() {
        let json = r#"{
            "id": ["A", "B"],
            "size": [4294967296, 4294967296],
            "value": { "0": 1 }
        }"#;
        let err = Dataset::from_json(json).unwrap_err();
        assert!(matches!(err, CubeError::DatasetParse(ref msg) if msg.contains("overflows")));
    }

    #[test]
    fn huge_sparse_cube_is_rejected() {
        let json = r#"{
            "id": ["A", "B"],
            "size": [100000, 100000],
            "value": { "0": 1 }
        }"#;
        let err = Dataset::from_json(json).unwrap_err();
        assert!(matches!(err, CubeError::DatasetParse(ref msg) if msg.contains("exceeds")));
    }

    #[test]
    fn dense_length_must_match_size() {
        let too_many = r#"{ "id": ["A"], "size": [2], "value": [1, 2, 3] }"#;
        let err = Dataset::from_json(too_many).unwrap_err();
        assert!(matches!(err, CubeError::DatasetParse(ref msg) if msg.contains("3 entries")));

        let too_few = r#"{ "id": ["A"], "size": [2], "value": [1] }"#;
        assert!(matches!(Dataset::from_json(too_few), Err(CubeError::DatasetParse(_))));
    }

    #[test]
    fn collection_is_not_a_dataset() {
        let json = r#"{ "class": "collection", "id": [], "size": [], "value": [] }"#;
        let err = Dataset::from_json(json).unwrap_err();
        assert!(matches!(err, CubeError::NotADataset(ref class) if class == "collection"));
    }

    #[test]
    fn mismatched_id_and_size() {
        let json = r#"{ "id": ["A", "B"], "size": [2], "value": [1, 2] }"#;
        assert!(matches!(Dataset::from_json(json), Err(CubeError::DatasetParse(_))));
    }

    #[test]
    fn missing_index_uses_label_keys() {
        let json = r#"{
            "id": ["UNIT"],
            "size": [1],
            "dimension": { "UNIT": { "category": { "label": { "EUR": "Euro" } } } },
            "value": [7]
        }"#;
        let ds = Dataset::from_json(json).unwrap();
        assert_eq!(ds.dimension["UNIT"].category.ordered_codes(), vec!["EUR"]);
    }

    #[test]
    fn row_accessors_and_field_lookup() {
        let row = Row::new(5.0, [("STATISTIC", "A"), ("TLIST(A1)", "2020")])
            .with_label("STATISTIC", "Cattle");
        assert_eq!(row.code("STATISTIC"), Some("A"));
        assert_eq!(row.label("STATISTIC"), Some("Cattle"));
        assert_eq!(row.label("TLIST(A1)"), Some("2020"));
        assert_eq!(row.field("STATISTIC_label"), Some("Cattle"));
        assert_eq!(row.field("TLIST(A1)"), Some("2020"));
        assert_eq!(row.field("missing"), None);
        assert_eq!(dimension_code(&row, "STATISTIC"), Some("A"));
        assert_eq!(dimension_label(&row, "STATISTIC"), Some("Cattle"));
    }

    #[test]
    fn row_serializes_flat() {
        let row = Row::new(2.0, [("STAT", "X")]).with_label("STAT", "Ex");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({ "STAT": "X", "STAT_label": "Ex", "value": 2.0 }));
        assert_eq!(serde_json::Value::Object(row.to_record()), json);
    }
}
