//! Insert model and the row-filling rule

use serde::{Deserialize, Serialize};

/// One row of values; `None` stands for SQL NULL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertRow {
    pub values: Vec<Option<String>>,
}

impl InsertRow {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Model built from an INSERT statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertModel {
    pub table_name: String,
    /// Target columns in declaration order
    pub column_names: Vec<String>,
    pub rows: Vec<InsertRow>,
}

impl InsertModel {
    /// Create a model holding a single empty row
    pub fn new(table_name: impl Into<String>, column_names: Vec<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_names,
            rows: vec![InsertRow::default()],
        }
    }

    /// Append a value to the current row.
    ///
    /// The flat value stream is cut into rows of `column_names.len()` values:
    /// once the last row is full, a new row is started. Without a declared
    /// column list the width is zero, so every value starts its own row and
    /// the initial row stays empty.
    pub fn push_value(&mut self, value: Option<String>) {
        let width = self.column_names.len();
        let needs_new_row = match self.rows.last() {
            Some(row) => row.len() >= width,
            None => true,
        };

        if needs_new_row {
            self.rows.push(InsertRow::default());
        }

        if let Some(row) = self.rows.last_mut() {
            row.values.push(value);
        }
    }

    /// Total number of values across all rows
    pub fn value_count(&self) -> usize {
        self.rows.iter().map(InsertRow::len).sum()
    }
}
