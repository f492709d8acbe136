//! Tabular results: ordered records with a column list, and the inner join
//! that stitches the features and classifications catalogs together.
//!
//! Join semantics follow a dataframe merge: left rows are walked in order and
//! each emits one output row per matching right row (in right order). Rows
//! whose key is missing or null never match.

use serde_json::Value;
use std::collections::HashMap;

use crate::types::{Record, ID_KEY};

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Build a table whose columns are the union of record keys in
    /// first-appearance order.
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, `Null` where a row lacks the key.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&Value::Null))
            .collect()
    }

    /// The non-null `_id` values, in row order.
    pub fn ids(&self) -> Vec<Value> {
        self.rows
            .iter()
            .filter_map(|row| row.get(ID_KEY))
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Inner join on `on`. Overlapping non-key columns are suffixed `_x`
    /// (left) and `_y` (right).
    pub fn inner_join(&self, right: &Table, on: &str) -> Table {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(key) = join_key(row, on) {
                index.entry(key).or_default().push(i);
            }
        }

        let overlap: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.as_str() != on && right.columns.contains(c))
            .map(String::as_str)
            .collect();
        let rename = |name: &str, suffix: &str| -> String {
            if overlap.contains(&name) {
                format!("{name}{suffix}")
            } else {
                name.to_string()
            }
        };

        let mut columns: Vec<String> = self.columns.iter().map(|c| rename(c.as_str(), LEFT_SUFFIX)).collect();
        columns.extend(
            right
                .columns
                .iter()
                .filter(|c| c.as_str() != on)
                .map(|c| rename(c.as_str(), RIGHT_SUFFIX)),
        );

        let mut rows = Vec::new();
        for left_row in &self.rows {
            let Some(key) = join_key(left_row, on) else {
                continue;
            };
            let Some(matches) = index.get(&key) else {
                continue;
            };
            for &ri in matches {
                let mut row = Record::new();
                for (k, v) in left_row {
                    row.insert(rename(k.as_str(), LEFT_SUFFIX), v.clone());
                }
                for (k, v) in &right.rows[ri] {
                    if k != on {
                        row.insert(rename(k.as_str(), RIGHT_SUFFIX), v.clone());
                    }
                }
                rows.push(row);
            }
        }

        Table { columns, rows }
    }
}

/// Canonical string form of a join key. Integers and floats with the same
/// integral value compare equal, matching how a dataframe merge treats an
/// int64 column against a float64 one.
fn join_key(row: &Record, on: &str) -> Option<String> {
    match row.get(on)? {
        Value::Null => None,
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Some(format!("n:{i}")),
            (None, Some(u), _) => Some(format!("n:{u}")),
            (None, None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.2e18 => {
                Some(format!("n:{}", f as i64))
            }
            (_, _, Some(f)) => Some(format!("f:{f}")),
            _ => None,
        },
        Value::String(s) => Some(format!("s:{s}")),
        other => Some(format!("j:{other}")),
    }
}
