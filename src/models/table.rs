//! Table creation model

use serde::{Deserialize, Serialize};

/// Column declared by a CREATE TABLE statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModel {
    /// Column name
    pub column_name: String,
    /// Data type as written in the source (e.g., "INT", "VARCHAR(10)")
    pub data_type: String,
    /// Whether the column allows NULL values
    pub is_nullable: bool,
    /// Normalized default literal; empty when the column has no default
    pub default: Option<String>,
    /// Whether the column is part of the primary key
    pub is_primary_key: bool,
    /// Unique flag
    pub is_unique: bool,
}

impl ColumnModel {
    /// Create a nullable column without default or key flags
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: Some(String::new()),
            is_primary_key: false,
            is_unique: false,
        }
    }
}

/// Model built from a CREATE TABLE statement
///
/// Column names are kept as declared; duplicates are not removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableModel {
    pub table_name: String,
    pub columns: Vec<ColumnModel>,
}

impl CreateTableModel {
    /// Create an empty table model
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// First column with exactly this name
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.column_name == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut ColumnModel> {
        self.columns.iter_mut().find(|c| c.column_name == name)
    }
}
