//! sql-ingest - Turns SQL scripts into typed table models
//!
//! Provides:
//! - Statement segmentation of raw script text
//! - Parsing through `sqlparser`
//! - Model building for CREATE TABLE, INSERT and DROP TABLE
//! - Dispatch of models to handlers, including HTTP handlers
//! - A script processor with per-statement error isolation and cancellation

pub mod build;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod processor;
pub mod segment;

// Re-export commonly used types
pub use build::{BuildError, ModelBuilderRegistry, StatementKind};
pub use config::{ConfigError, IngestConfig};
pub use dispatch::{DispatchResponse, HandlerError, QueryDispatcher, QueryHandler};
#[cfg(feature = "api-backend")]
pub use handlers::{ApiClient, ApiDropHandler, ApiInsertHandler, ApiTableHandler};
pub use models::{
    ColumnModel, CreateTableModel, DropTableModel, InsertModel, InsertRow, QueryResult, ResultKind,
};
pub use parser::{ParseError, QueryParser, SqlDialect, SqlParserBackend};
pub use processor::{ErrorReport, ProcessError, ScriptProcessor, ScriptReport, StatementOutcome};
pub use segment::{LineMode, StatementSegmenter, split_statements};

// Re-export the parser crate so callers can implement QueryParser
pub use sqlparser;
