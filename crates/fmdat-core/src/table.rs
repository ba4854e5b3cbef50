//! Tabular data sections (cross-section points, flow-time pairs, ...).

use serde::{Deserialize, Serialize};

use crate::{
    field::{FieldError, FieldKey},
    value::{Value, ValueKind},
};

/// A named, typed table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    name: FieldKey,
    kind: ValueKind,
}

impl Column {
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: FieldKey::new(name),
            kind,
        }
    }

    pub fn name(&self) -> &FieldKey {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// An ordered sequence of fixed-width rows.
///
/// Every row holds exactly one cell per column and every cell matches the
/// declared column kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the index of a column by any casing of its name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let key = FieldKey::new(name);
        self.columns.iter().position(|c| c.name == key)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Fails if the row width or any cell kind does not match the columns.
    pub fn push(&mut self, row: Vec<Value>) -> Result<(), FieldError> {
        let row = self.check_row(row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Inserts a row at `index`, shifting later rows down.
    pub fn insert(&mut self, index: usize, row: Vec<Value>) -> Result<(), FieldError> {
        if index > self.rows.len() {
            return Err(FieldError::RowOutOfRange {
                row: index,
                len: self.rows.len(),
            });
        }
        let row = self.check_row(row)?;
        self.rows.insert(index, row);
        Ok(())
    }

    /// Removes and returns the row at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Vec<Value>, FieldError> {
        if index >= self.rows.len() {
            return Err(FieldError::RowOutOfRange {
                row: index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Replaces a single cell.
    pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<(), FieldError> {
        let len = self.rows.len();
        let index = self
            .column_index(column)
            .ok_or_else(|| FieldError::Undeclared(FieldKey::new(column).to_string()))?;
        let kind = self.columns[index].kind;
        let found = value.kind();
        let value = value.coerce(kind).ok_or_else(|| FieldError::KindMismatch {
            key: self.columns[index].name.to_string(),
            expected: kind,
            found,
        })?;
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(FieldError::RowOutOfRange { row, len })?;
        cells[index] = value;
        Ok(())
    }

    /// Replaces every cell of `column` equal to `from` with `to`, returning
    /// the rows changed.
    ///
    /// # Errors
    ///
    /// Fails for an undeclared column or a value of the wrong kind. Nothing
    /// is changed on error.
    pub fn replace_all(&mut self, column: &str, from: &Value, to: Value) -> Result<Vec<usize>, FieldError> {
        let index = self
            .column_index(column)
            .ok_or_else(|| FieldError::Undeclared(FieldKey::new(column).to_string()))?;
        let kind = self.columns[index].kind;
        let found = to.kind();
        let to = to.coerce(kind).ok_or_else(|| FieldError::KindMismatch {
            key: self.columns[index].name.to_string(),
            expected: kind,
            found,
        })?;
        let mut changed = Vec::new();
        for (row, cells) in self.rows.iter_mut().enumerate() {
            if &cells[index] == from {
                cells[index] = to.clone();
                changed.push(row);
            }
        }
        Ok(changed)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn check_row(&self, row: Vec<Value>) -> Result<Vec<Value>, FieldError> {
        if row.len() != self.columns.len() {
            return Err(FieldError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        row.into_iter()
            .zip(&self.columns)
            .map(|(value, column)| {
                let found = value.kind();
                value.coerce(column.kind).ok_or_else(|| FieldError::KindMismatch {
                    key: column.name.to_string(),
                    expected: column.kind,
                    found,
                })
            })
            .collect()
    }
}
