//! Model building
//!
//! Converts a parsed `sqlparser` statement into one of the closed set of
//! [`QueryResult`] models. Statement kinds without a builder produce no model;
//! that is not an error.

pub mod create_table;
pub mod default_value;
pub mod drop;
pub mod insert;

use std::fmt;

use sqlparser::ast::{ObjectName, ObjectType, Statement};
use tracing::debug;

use crate::models::QueryResult;

pub use default_value::normalize_default;

/// Error raised while building a model from a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Unsupported node type: {element}")]
    UnsupportedStatementElement { element: String },
    #[error("Unsupported insert target: {0}")]
    UnsupportedTarget(String),
}

/// Kind of a parsed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    CreateTable,
    Insert,
    DropTable,
    /// SELECT and other queries
    Query,
    /// Anything else, named by its leading keyword
    Other(String),
}

impl StatementKind {
    pub fn of(statement: &Statement) -> Self {
        match statement {
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Drop {
                object_type: ObjectType::Table,
                ..
            } => StatementKind::DropTable,
            Statement::Query(_) => StatementKind::Query,
            other => StatementKind::Other(
                other
                    .to_string()
                    .split_whitespace()
                    .next()
                    .unwrap_or("UNKNOWN")
                    .to_uppercase(),
            ),
        }
    }

}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::CreateTable => f.write_str("CREATE TABLE"),
            StatementKind::Insert => f.write_str("INSERT"),
            StatementKind::DropTable => f.write_str("DROP TABLE"),
            StatementKind::Query => f.write_str("QUERY"),
            StatementKind::Other(keyword) => f.write_str(keyword),
        }
    }
}

/// Dispatches a statement to the builder registered for its kind
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilderRegistry;

impl ModelBuilderRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Build the model for `statement`, or `Ok(None)` when its kind has no
    /// builder.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sql_ingest::build::ModelBuilderRegistry;
    /// use sql_ingest::parser::{QueryParser, SqlParserBackend};
    ///
    /// let statement = SqlParserBackend::default()
    ///     .parse("CREATE TABLE t (id INT)")
    ///     .unwrap();
    /// let model = ModelBuilderRegistry::new().build(&statement).unwrap();
    /// assert!(model.is_some());
    /// ```
    pub fn build(&self, statement: &Statement) -> Result<Option<QueryResult>, BuildError> {
        let model = match statement {
            Statement::CreateTable(create) => create_table::build(create)?.into(),
            Statement::Insert(insert) => insert::build(insert)?.into(),
            Statement::Drop {
                object_type: ObjectType::Table,
                if_exists,
                names,
                cascade,
                ..
            } => drop::build(names, *if_exists, *cascade).into(),
            other => {
                debug!(kind = %StatementKind::of(other), "No model builder for statement kind");
                return Ok(None);
            }
        };

        Ok(Some(model))
    }
}

/// Render an object name as its identifier values joined with `.`
pub(crate) fn object_name_text(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| {
            part.as_ident()
                .map(|ident| ident.value.clone())
                .unwrap_or_else(|| part.to_string())
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{QueryParser, SqlParserBackend};

    fn parse(sql: &str) -> Statement {
        SqlParserBackend::default().parse(sql).unwrap()
    }

    #[test]
    fn test_statement_kinds() {
        assert_eq!(
            StatementKind::of(&parse("CREATE TABLE t (id INT)")),
            StatementKind::CreateTable
        );
        assert_eq!(
            StatementKind::of(&parse("INSERT INTO t (id) VALUES (1)")),
            StatementKind::Insert
        );
        assert_eq!(
            StatementKind::of(&parse("DROP TABLE t")),
            StatementKind::DropTable
        );
        assert_eq!(StatementKind::of(&parse("SELECT 1")), StatementKind::Query);
        assert_eq!(
            StatementKind::of(&parse("DELETE FROM t")),
            StatementKind::Other("DELETE".to_string())
        );
    }

    #[test]
    fn test_select_has_no_builder() {
        let registry = ModelBuilderRegistry::new();
        let model = registry.build(&parse("SELECT a FROM t")).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn test_drop_view_has_no_builder() {
        let registry = ModelBuilderRegistry::new();
        assert!(registry.build(&parse("DROP VIEW v")).unwrap().is_none());
    }

    #[test]
    fn test_qualified_name_text() {
        let registry = ModelBuilderRegistry::new();
        let model = registry
            .build(&parse("CREATE TABLE public.users (id INT)"))
            .unwrap()
            .unwrap();
        assert_eq!(model.table_name(), "public.users");
    }
}
