//! Query dispatch
//!
//! Routes a built model to the single handler able to process it. The
//! handler collection is assembled once at startup and only read afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::QueryResult;

/// HTTP status used for a successfully handled statement
pub const STATUS_OK: u16 = 200;
/// HTTP status used when no handler accepts a model
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Error type for handler operations
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Backend returned status {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Handler call was cancelled")]
    Cancelled,
}

/// Response produced for one dispatched model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: String,
}

impl DispatchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            body: body.into(),
        }
    }

    /// Client error naming a model type no handler accepts
    pub fn unsupported(type_name: &str) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            body: format!("Unsupported SQL query type: {}", type_name),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handler executing the effect of one model variant
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Handler name used in logs
    fn name(&self) -> &str;

    /// Whether this handler accepts the model's variant
    fn can_handle(&self, model: &QueryResult) -> bool;

    /// Process the model, honoring `cancel` while the call is in flight
    async fn handle(
        &self,
        model: QueryResult,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, HandlerError>;
}

/// Routes models to the first handler that accepts them
#[derive(Clone, Default)]
pub struct QueryDispatcher {
    handlers: Vec<Arc<dyn QueryHandler>>,
}

impl QueryDispatcher {
    pub fn new(handlers: Vec<Arc<dyn QueryHandler>>) -> Self {
        Self { handlers }
    }

    /// Register another handler
    pub fn with_handler(mut self, handler: impl QueryHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn handlers(&self) -> &[Arc<dyn QueryHandler>] {
        &self.handlers
    }

    /// Forward `model` to the first handler whose predicate accepts it.
    ///
    /// A model nobody accepts yields a 400 [`DispatchResponse`] rather than an
    /// error. Handler failures are returned unchanged.
    pub async fn dispatch(
        &self,
        model: QueryResult,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, HandlerError> {
        let Some(handler) = self.handlers.iter().find(|h| h.can_handle(&model)) else {
            warn!(model = model.type_name(), "No handler accepts model");
            return Ok(DispatchResponse::unsupported(model.type_name()));
        };

        debug!(
            handler = handler.name(),
            kind = model.kind().name(),
            table = model.table_name(),
            "Dispatching model"
        );
        handler.handle(model, cancel).await
    }
}
