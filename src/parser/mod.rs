//! SQL parsing
//!
//! Wraps the `sqlparser` crate behind the [`QueryParser`] trait so the
//! processor can be driven by any parser that yields a `sqlparser` syntax
//! tree for a single statement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    AnsiDialect, Dialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    SQLiteDialect,
};
use sqlparser::parser::Parser;
use tracing::debug;

/// Error raised while parsing one statement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("SQL parse error: {0}")]
    Syntax(String),
    #[error("Statement is empty")]
    Empty,
    #[error("Expected a single statement, found {0}")]
    MultipleStatements(usize),
}

/// SQL dialect used by [`SqlParserBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Generic,
    MySql,
    Postgres,
    Sqlite,
    MsSql,
    Ansi,
}

impl SqlDialect {
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::Generic => "generic",
            SqlDialect::MySql => "mysql",
            SqlDialect::Postgres => "postgres",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MsSql => "mssql",
            SqlDialect::Ansi => "ansi",
        }
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::MsSql => Box::new(MsSqlDialect {}),
            SqlDialect::Ansi => Box::new(AnsiDialect {}),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" => Ok(SqlDialect::Generic),
            "mysql" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            "sqlite" => Ok(SqlDialect::Sqlite),
            "mssql" | "sqlserver" | "sql_server" => Ok(SqlDialect::MsSql),
            "ansi" => Ok(SqlDialect::Ansi),
            _ => Err(format!(
                "Invalid SQL dialect: {}. Expected: generic, mysql, postgres, sqlite, mssql, ansi",
                s
            )),
        }
    }
}

/// Parser collaborator turning one statement string into a syntax tree
pub trait QueryParser: Send + Sync {
    fn parse(&self, sql: &str) -> Result<Statement, ParseError>;
}

/// [`QueryParser`] backed by `sqlparser`
#[derive(Debug, Clone, Default)]
pub struct SqlParserBackend {
    dialect: SqlDialect,
}

impl SqlParserBackend {
    /// Create a parser for the given dialect
    ///
    /// # Example
    ///
    /// ```rust
    /// use sql_ingest::parser::{QueryParser, SqlDialect, SqlParserBackend};
    ///
    /// let parser = SqlParserBackend::new(SqlDialect::MySql);
    /// assert!(parser.parse("CREATE TABLE t (id INT)").is_ok());
    /// ```
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }
}

impl QueryParser for SqlParserBackend {
    fn parse(&self, sql: &str) -> Result<Statement, ParseError> {
        debug!(dialect = %self.dialect, "Parsing statement");

        let dialect = self.dialect.dialect();
        let mut statements = Parser::parse_sql(dialect.as_ref(), sql)
            .map_err(|e| ParseError::Syntax(e.to_string()))?;

        match statements.len() {
            0 => Err(ParseError::Empty),
            1 => Ok(statements.remove(0)),
            n => Err(ParseError::MultipleStatements(n)),
        }
    }
}
