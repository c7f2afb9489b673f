//! Script processing
//!
//! Drives one SQL script through segmentation, parsing, model building and
//! dispatch. Statements run strictly in order, each one finishing before the
//! next input line is read. A failing statement is reported inline and never
//! stops the statements after it.

mod error;

pub use error::{
    ErrorDetails, ErrorReport, ProcessError, STATUS_CLIENT_CLOSED_REQUEST, STATUS_INTERNAL_ERROR,
};

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::build::{ModelBuilderRegistry, StatementKind};
use crate::dispatch::{DispatchResponse, HandlerError, QueryDispatcher, STATUS_BAD_REQUEST};
use crate::parser::QueryParser;
use crate::segment::{LineMode, StatementSegmenter};

/// Result of one statement of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementOutcome {
    /// Zero-based position of the statement in the script
    pub index: usize,
    pub statement: String,
    pub status: u16,
    /// Handler response body, or `Error: <message>` on failure
    pub body: String,
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Report of a completed script run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<StatementOutcome>,
}

impl ScriptReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    /// Outcome texts in statement order
    pub fn texts(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.body.as_str()).collect()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// One-line summary joining every outcome text with `,`
    pub fn summary(&self) -> String {
        format!(
            "Data with {} queries processed successfully.",
            self.texts().join(",")
        )
    }
}

/// Runs scripts against a parser and a dispatcher
///
/// The parser and dispatcher are shared read-only, so one processor can serve
/// several scripts concurrently.
#[derive(Clone)]
pub struct ScriptProcessor {
    parser: Arc<dyn QueryParser>,
    builders: ModelBuilderRegistry,
    dispatcher: Arc<QueryDispatcher>,
    mode: LineMode,
}

impl ScriptProcessor {
    pub fn new(
        parser: impl QueryParser + 'static,
        dispatcher: impl Into<Arc<QueryDispatcher>>,
        mode: LineMode,
    ) -> Self {
        Self {
            parser: Arc::new(parser),
            builders: ModelBuilderRegistry::new(),
            dispatcher: dispatcher.into(),
            mode,
        }
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Process every statement read from `reader`.
    ///
    /// Returns the per-statement outcomes, or an error when the stream fails
    /// or `cancel` fires. Cancellation is observed before each line, before
    /// each statement and while a handler call is in flight.
    pub async fn process<R>(
        &self,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<ScriptReport, ProcessError>
    where
        R: AsyncBufRead + Unpin,
    {
        let report = ScriptReport::new();
        let span = info_span!("script_run", run_id = %report.run_id, line_mode = %self.mode);
        self.run(reader, cancel, report).instrument(span).await
    }

    async fn run<R>(
        &self,
        reader: R,
        cancel: &CancellationToken,
        mut report: ScriptReport,
    ) -> Result<ScriptReport, ProcessError>
    where
        R: AsyncBufRead + Unpin,
    {
        let start = Instant::now();
        info!(run_id = %report.run_id, "Starting script");

        let mut segmenter = StatementSegmenter::new(self.mode);
        let mut lines = reader.lines();

        loop {
            if cancel.is_cancelled() {
                warn!(run_id = %report.run_id, "Script cancelled");
                return Err(ProcessError::Cancelled);
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };
            for statement in segmenter.push_line(&line) {
                self.run_statement(statement, cancel, &mut report).await?;
            }
        }

        if let Some(statement) = segmenter.finish() {
            self.run_statement(statement, cancel, &mut report).await?;
        }

        info!(
            run_id = %report.run_id,
            statements = report.outcomes.len(),
            failed = report.failed_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Script completed"
        );
        Ok(report)
    }

    async fn run_statement(
        &self,
        statement: String,
        cancel: &CancellationToken,
        report: &mut ScriptReport,
    ) -> Result<(), ProcessError> {
        if cancel.is_cancelled() {
            warn!(run_id = %report.run_id, "Script cancelled");
            return Err(ProcessError::Cancelled);
        }

        let index = report.outcomes.len();
        let (status, body) = match self.execute(&statement, cancel).await {
            Ok(response) => (response.status, response.body),
            Err(StatementFailure::Handler(HandlerError::Cancelled)) => {
                warn!(run_id = %report.run_id, index, "Script cancelled during handler call");
                return Err(ProcessError::Cancelled);
            }
            Err(failure) => {
                warn!(index, error = %failure.message(), "Statement failed");
                (failure.status(), format!("Error: {}", failure.message()))
            }
        };

        debug!(index, status, "Statement processed");
        report.outcomes.push(StatementOutcome {
            index,
            statement,
            status,
            body,
        });
        Ok(())
    }

    async fn execute(
        &self,
        statement: &str,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, StatementFailure> {
        let tree = self
            .parser
            .parse(statement)
            .map_err(|e| StatementFailure::Rejected(e.to_string()))?;

        let Some(model) = self
            .builders
            .build(&tree)
            .map_err(|e| StatementFailure::Rejected(e.to_string()))?
        else {
            let kind = StatementKind::of(&tree);
            return Ok(DispatchResponse::unsupported(&kind.to_string()));
        };

        self.dispatcher
            .dispatch(model, cancel)
            .await
            .map_err(StatementFailure::Handler)
    }
}

/// Why a single statement produced no handler response
enum StatementFailure {
    /// Parse or build error
    Rejected(String),
    Handler(HandlerError),
}

impl StatementFailure {
    fn message(&self) -> String {
        match self {
            StatementFailure::Rejected(message) => message.clone(),
            StatementFailure::Handler(error) => error.to_string(),
        }
    }

    fn status(&self) -> u16 {
        match self {
            StatementFailure::Rejected(_) => STATUS_BAD_REQUEST,
            StatementFailure::Handler(HandlerError::Backend { status, .. }) => *status,
            StatementFailure::Handler(_) => STATUS_INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::QueryHandler;
    use crate::models::QueryResult;
    use crate::parser::SqlParserBackend;
    use async_trait::async_trait;
    use tokio::runtime::Runtime;

    fn runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    /// Echoes the model kind and table name
    struct Echo;

    #[async_trait]
    impl QueryHandler for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn can_handle(&self, _model: &QueryResult) -> bool {
            true
        }

        async fn handle(
            &self,
            model: QueryResult,
            _cancel: &CancellationToken,
        ) -> Result<DispatchResponse, HandlerError> {
            Ok(DispatchResponse::ok(format!(
                "{}:{}",
                model.kind().name(),
                model.table_name()
            )))
        }
    }

    fn processor() -> ScriptProcessor {
        ScriptProcessor::new(
            SqlParserBackend::default(),
            QueryDispatcher::default().with_handler(Echo),
            LineMode::ResetPerLine,
        )
    }

    #[test]
    fn test_statements_processed_in_order() {
        runtime().block_on(async {
            let script = "CREATE TABLE a (id INT);\nINSERT INTO a (id) VALUES (1);\nDROP TABLE a;";
            let report = processor()
                .process(script.as_bytes(), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(report.texts(), vec!["create:a", "insert:a", "drop:a"]);
            assert_eq!(report.outcomes[1].index, 1);
            assert_eq!(report.outcomes[1].statement, "INSERT INTO a (id) VALUES (1)");
            assert_eq!(report.failed_count(), 0);
        });
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        runtime().block_on(async {
            let report = processor()
                .process("DROP TABLE z".as_bytes(), &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(report.texts(), vec!["drop:z"]);
        });
    }

    #[test]
    fn test_select_is_unsupported() {
        runtime().block_on(async {
            let report = processor()
                .process("SELECT 1;".as_bytes(), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(report.outcomes[0].status, STATUS_BAD_REQUEST);
            assert_eq!(report.outcomes[0].body, "Unsupported SQL query type: QUERY");
        });
    }

    #[test]
    fn test_cancelled_before_start() {
        runtime().block_on(async {
            let cancel = CancellationToken::new();
            cancel.cancel();

            let result = processor().process("DROP TABLE a;".as_bytes(), &cancel).await;
            assert!(matches!(result, Err(ProcessError::Cancelled)));
        });
    }

    #[test]
    fn test_summary_joins_outcomes() {
        runtime().block_on(async {
            let report = processor()
                .process(
                    "CREATE TABLE a (id INT); CREATE TABL b;".as_bytes(),
                    &CancellationToken::new(),
                )
                .await
                .unwrap();

            let summary = report.summary();
            assert!(summary.starts_with("Data with create:a,Error: SQL parse error: "));
            assert!(summary.ends_with(" queries processed successfully."));
        });
    }
}
