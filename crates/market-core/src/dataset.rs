//! [`Dataset`] — an ordered table of [`Value`] rows.

use std::collections::HashSet;

use crate::{Error, Result, Value};

/// Ordered column names plus ordered rows.
///
/// Every row is exactly as wide as the column list and column names are
/// unique; both are checked on construction. An empty dataset (no rows, and
/// possibly no columns) is a normal state: a first run, or an absent table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
  columns: Vec<String>,
  rows:    Vec<Vec<Value>>,
}

impl Dataset {
  /// A dataset with the given columns and no rows.
  pub fn new<I, S>(columns: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
    let mut seen = HashSet::with_capacity(columns.len());
    for column in &columns {
      if !seen.insert(column.as_str()) {
        return Err(Error::DuplicateColumn(column.clone()));
      }
    }
    Ok(Self { columns, rows: Vec::new() })
  }

  /// Build a dataset from already-materialised rows.
  pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut dataset = Self::new(columns)?;
    dataset.rows.reserve(rows.len());
    for row in rows {
      dataset.push_row(row)?;
    }
    Ok(dataset)
  }

  pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
    if row.len() != self.columns.len() {
      return Err(Error::RowWidth {
        expected: self.columns.len(),
        found:    row.len(),
      });
    }
    self.rows.push(row);
    Ok(())
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Vec<Value>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.column_index(name).is_some()
  }

  /// The value of `column` in row `row`, if both exist.
  pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
    let idx = self.column_index(column)?;
    self.rows.get(row).map(|r| &r[idx])
  }

  /// All values of one column, in row order.
  pub fn column_values(
    &self,
    column: &str,
  ) -> Option<impl Iterator<Item = &Value> + '_> {
    let idx = self.column_index(column)?;
    Some(self.rows.iter().map(move |r| &r[idx]))
  }

  /// Set `column` to `value` on every row, appending the column if it does
  /// not exist yet.
  pub fn set_constant_column(&mut self, column: &str, value: Value) {
    match self.column_index(column) {
      Some(idx) => {
        for row in &mut self.rows {
          row[idx] = value.clone();
        }
      }
      None => {
        self.columns.push(column.to_owned());
        for row in &mut self.rows {
          row.push(value.clone());
        }
      }
    }
  }

  pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
    (self.columns, self.rows)
  }
}
