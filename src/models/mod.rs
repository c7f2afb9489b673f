//! Statement models
//!
//! Typed, closed-variant representations of parsed SQL statements. A model is
//! built fresh for every statement and handed once to the dispatcher.

pub mod drop;
pub mod insert;
pub mod table;

pub use drop::DropTableModel;
pub use insert::{InsertModel, InsertRow};
pub use table::{ColumnModel, CreateTableModel};

use serde::{Deserialize, Serialize};

/// Kind tag carried by every query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Table creation
    Create,
    /// Table removal
    Drop,
    /// Row insertion
    Insert,
}

impl ResultKind {
    /// Lowercase name used in logs and URLs
    pub fn name(&self) -> &'static str {
        match self {
            ResultKind::Create => "create",
            ResultKind::Drop => "drop",
            ResultKind::Insert => "insert",
        }
    }
}

/// A model built from one SQL statement
///
/// # Example
///
/// ```rust
/// use sql_ingest::models::{CreateTableModel, QueryResult, ResultKind};
///
/// let model = QueryResult::CreateTable(CreateTableModel::new("users"));
/// assert_eq!(model.kind(), ResultKind::Create);
/// assert_eq!(model.type_name(), "CreateTableModel");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resultKind", rename_all = "camelCase")]
pub enum QueryResult {
    CreateTable(CreateTableModel),
    Insert(InsertModel),
    DropTable(DropTableModel),
}

impl QueryResult {
    /// Kind tag of this result
    pub fn kind(&self) -> ResultKind {
        match self {
            QueryResult::CreateTable(_) => ResultKind::Create,
            QueryResult::Insert(_) => ResultKind::Insert,
            QueryResult::DropTable(_) => ResultKind::Drop,
        }
    }

    /// Name of the concrete model type, used when reporting unhandled models
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryResult::CreateTable(_) => "CreateTableModel",
            QueryResult::Insert(_) => "InsertModel",
            QueryResult::DropTable(_) => "DropTableModel",
        }
    }

    /// Primary table the model targets
    pub fn table_name(&self) -> &str {
        match self {
            QueryResult::CreateTable(model) => &model.table_name,
            QueryResult::Insert(model) => &model.table_name,
            QueryResult::DropTable(model) => model
                .table_names
                .first()
                .map(String::as_str)
                .unwrap_or(""),
        }
    }
}

impl From<CreateTableModel> for QueryResult {
    fn from(model: CreateTableModel) -> Self {
        QueryResult::CreateTable(model)
    }
}

impl From<InsertModel> for QueryResult {
    fn from(model: InsertModel) -> Self {
        QueryResult::Insert(model)
    }
}

impl From<DropTableModel> for QueryResult {
    fn from(model: DropTableModel) -> Self {
        QueryResult::DropTable(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_per_variant() {
        assert_eq!(
            QueryResult::from(CreateTableModel::new("t")).kind(),
            ResultKind::Create
        );
        assert_eq!(
            QueryResult::from(InsertModel::new("t", vec![])).kind(),
            ResultKind::Insert
        );
        assert_eq!(
            QueryResult::from(DropTableModel::new(vec!["t".to_string()])).kind(),
            ResultKind::Drop
        );
    }

    #[test]
    fn test_serialized_tag() {
        let model = QueryResult::from(InsertModel::new("orders", vec!["id".to_string()]));
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["resultKind"], "insert");
        assert_eq!(json["tableName"], "orders");
    }
}
