//! Typed report tables
//!
//! Every aggregate report produces a [`ReportTable`]: a title, an ordered set
//! of columns and fixed-width rows of [`Cell`]s. Renderers never look at the
//! database; they only format these values.

use serde_json::{Map, Value};

/// A report column: a machine key and a display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A single typed value in a report row
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(i64),
    /// Monetary or averaged value, kept at two decimals
    Amount(f64),
    Range { min: f64, max: f64 },
    /// Labelled sub-totals, in display order
    Breakdown(Vec<(String, f64)>),
    Null,
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn amount(value: f64) -> Self {
        Cell::Amount(round2(value))
    }

    /// An amount that is null when there was nothing to aggregate
    pub fn opt_amount(value: Option<f64>) -> Self {
        value.map(Cell::amount).unwrap_or(Cell::Null)
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        match (min, max) {
            (Some(min), Some(max)) => Cell::Range {
                min: round2(min),
                max: round2(max),
            },
            _ => Cell::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Plain text form used by CSV and table output
    pub fn csv_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Amount(v) => format!("{:.2}", v),
            Cell::Range { min, max } => format!("{:.2} - {:.2}", min, max),
            Cell::Breakdown(parts) => parts
                .iter()
                .map(|(k, v)| format!("{}: {:.2}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
            Cell::Null => String::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Count(n) => Value::from(*n),
            Cell::Amount(v) => Value::from(*v),
            Cell::Range { min, max } => {
                let mut obj = Map::new();
                obj.insert("min".to_string(), Value::from(*min));
                obj.insert("max".to_string(), Value::from(*max));
                Value::Object(obj)
            }
            Cell::Breakdown(parts) => Value::Object(
                parts
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(*v)))
                    .collect(),
            ),
            Cell::Null => Value::Null,
        }
    }
}

/// Header plus rows of typed cells
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one cell per column
    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    /// Index of the column with the given key
    pub fn column(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Cell at `row` for the column `key`
    pub fn cell(&self, row: usize, key: &str) -> Option<&Cell> {
        let col = self.column(key)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Header record followed by one text record per row
    pub fn to_records(&self) -> Vec<Vec<String>> {
        let mut records = Vec::with_capacity(self.rows.len() + 1);
        records.push(self.labels().iter().map(|s| s.to_string()).collect());
        for row in &self.rows {
            records.push(row.iter().map(Cell::csv_text).collect());
        }
        records
    }

    /// Array of objects keyed by column key
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.rows
                .iter()
                .map(|row| {
                    let obj: Map<String, Value> = self
                        .columns
                        .iter()
                        .zip(row)
                        .map(|(col, cell)| (col.key.clone(), cell.to_json()))
                        .collect();
                    Value::Object(obj)
                })
                .collect(),
        )
    }
}
