//! In-memory tabular payload: named columns over rows of typed cells.
//! Row position is the index, so concatenation and filtering always leave it reset.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Type-tagged representation used for equality on join keys and row dedup.
    /// Nulls have no key: they never match anything.
    fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(format!("b:{b}")),
            Value::Int(i) => Some(format!("i:{i}")),
            Value::Float(f) => Some(format!("f:{f}")),
            Value::Text(s) => Some(format!("t:{s}")),
            Value::Date(d) => Some(format!("d:{d}")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

/// NaN and infinities have no JSON form, so they become `Null`.
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        if x.is_finite() {
            Value::Float(x)
        } else {
            Value::Null
        }
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Table {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Append a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Replace the values of `name`, or append it as a new column.
    /// `values` shorter than the table are padded with nulls.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        let mut values = values.into_iter();
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = values.next().unwrap_or_default();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(values.next().unwrap_or_default());
                }
            }
        }
    }

    /// Apply `f` to every cell of an existing column.
    pub fn map_column(&mut self, name: &str, mut f: impl FnMut(&Value) -> Value) -> Result<()> {
        let idx = self.require_column(name)?;
        for row in &mut self.rows {
            let mapped = f(&row[idx]);
            row[idx] = mapped;
        }
        Ok(())
    }

    pub fn rename_columns(&mut self, columns: Vec<String>) {
        debug_assert_eq!(columns.len(), self.columns.len());
        self.columns = columns;
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.require_column(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Project onto `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|r| keep(r));
    }

    /// Replace NaN and infinite floats with `Null`. Returns how many cells changed.
    pub fn null_non_finite(&mut self) -> usize {
        let mut replaced = 0;
        for cell in self.rows.iter_mut().flatten() {
            if matches!(cell, Value::Float(f) if !f.is_finite()) {
                *cell = Value::Null;
                replaced += 1;
            }
        }
        replaced
    }

    pub fn drop_nulls(&mut self, column: &str) -> Result<()> {
        let idx = self.require_column(column)?;
        self.rows.retain(|r| !r[idx].is_null());
        Ok(())
    }

    /// Keep the first occurrence of every fully identical row.
    pub fn drop_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key = row
                .iter()
                .map(|v| v.key().unwrap_or_else(|| "n:".to_string()))
                .collect::<Vec<_>>()
                .join("\u{1f}");
            seen.insert(key)
        });
    }

    /// Left join: every left row is kept; each matching right row produces one output row,
    /// unmatched left rows get nulls on the right side. Colliding names are suffixed `_x` / `_y`.
    pub fn left_join(&self, right: &Table, left_on: &str, right_on: &str) -> Result<Table> {
        let left_idx = self.require_column(left_on)?;
        let right_idx = right.require_column(right_on)?;

        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(key) = row[right_idx].key() {
                by_key.entry(key).or_default().push(i);
            }
        }

        let same_key_name = left_on == right_on;
        let right_cols: Vec<usize> = (0..right.columns.len())
            .filter(|&i| !(same_key_name && i == right_idx))
            .collect();

        let left_names: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let right_names: HashSet<&str> = right_cols
            .iter()
            .map(|&i| right.columns[i].as_str())
            .collect();
        let mut columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if right_names.contains(c.as_str()) {
                    format!("{c}_x")
                } else {
                    c.clone()
                }
            })
            .collect();
        columns.extend(right_cols.iter().map(|&i| {
            let c = &right.columns[i];
            if left_names.contains(c.as_str()) {
                format!("{c}_y")
            } else {
                c.clone()
            }
        }));

        let mut rows = Vec::with_capacity(self.rows.len());
        for left_row in &self.rows {
            let matches = left_row[left_idx]
                .key()
                .and_then(|k| by_key.get(&k));
            match matches {
                Some(indices) => {
                    for &ri in indices {
                        let mut row = left_row.clone();
                        row.extend(right_cols.iter().map(|&c| right.rows[ri][c].clone()));
                        rows.push(row);
                    }
                }
                None => {
                    let mut row = left_row.clone();
                    row.extend(right_cols.iter().map(|_| Value::Null));
                    rows.push(row);
                }
            }
        }

        Ok(Table { columns, rows })
    }

    /// Stack tables vertically over the union of their columns (first-seen order).
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let tables: Vec<Table> = tables.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for c in &table.columns {
                if !columns.contains(c) {
                    columns.push(c.clone());
                }
            }
        }

        let mut out = Table::new(columns);
        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| out.column_index(c))
                .collect();
            for row in table.rows {
                let mut full = vec![Value::Null; out.columns.len()];
                for (value, &target) in row.into_iter().zip(&mapping) {
                    full[target] = value;
                }
                out.rows.push(full);
            }
        }
        out
    }
}
