//! HTTP API handlers
//!
//! Forward built models as JSON to a table service. Every request carries the
//! optional bearer token and is raced against the caller's cancellation token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::{DispatchResponse, HandlerError, QueryDispatcher, QueryHandler};
use crate::models::QueryResult;

/// Shared HTTP client for the table service
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the service at `base_url`
    ///
    /// # Example
    ///
    /// ```rust
    /// use sql_ingest::handlers::ApiClient;
    ///
    /// let client = ApiClient::new("http://localhost:8080/api/v1", None, 30).unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:8080/api/v1");
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self, HandlerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| HandlerError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request with authentication headers
    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, self.url(path));

        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    /// POST `payload` as JSON to `path` and return the response body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, HandlerError> {
        if cancel.is_cancelled() {
            return Err(HandlerError::Cancelled);
        }

        let body = serde_json::to_vec(payload)
            .map_err(|e| HandlerError::Serialization(e.to_string()))?;
        let request = self
            .build_request(reqwest::Method::POST, path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        debug!(path = path, "Sending request to table service");

        tokio::select! {
            _ = cancel.cancelled() => Err(HandlerError::Cancelled),
            result = Self::send(request) => result,
        }
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<DispatchResponse, HandlerError> {
        let response = request
            .send()
            .await
            .map_err(|e| HandlerError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HandlerError::Network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Table service rejected request");
            return Err(HandlerError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        Ok(DispatchResponse::ok(body))
    }
}

/// Creates tables from [`QueryResult::CreateTable`] models
#[derive(Debug, Clone)]
pub struct ApiTableHandler {
    client: ApiClient,
}

impl ApiTableHandler {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryHandler for ApiTableHandler {
    fn name(&self) -> &str {
        "api-table"
    }

    fn can_handle(&self, model: &QueryResult) -> bool {
        matches!(model, QueryResult::CreateTable(_))
    }

    async fn handle(
        &self,
        model: QueryResult,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, HandlerError> {
        let table = match model {
            QueryResult::CreateTable(table) => table,
            other => return Ok(DispatchResponse::unsupported(other.type_name())),
        };
        self.client.post_json("/tables", &table, cancel).await
    }
}

/// Appends rows from [`QueryResult::Insert`] models
#[derive(Debug, Clone)]
pub struct ApiInsertHandler {
    client: ApiClient,
}

impl ApiInsertHandler {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn rows_path(table_name: &str) -> String {
        format!("/tables/{}/rows", urlencoding::encode(table_name))
    }
}

#[async_trait]
impl QueryHandler for ApiInsertHandler {
    fn name(&self) -> &str {
        "api-insert"
    }

    fn can_handle(&self, model: &QueryResult) -> bool {
        matches!(model, QueryResult::Insert(_))
    }

    async fn handle(
        &self,
        model: QueryResult,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, HandlerError> {
        let insert = match model {
            QueryResult::Insert(insert) => insert,
            other => return Ok(DispatchResponse::unsupported(other.type_name())),
        };
        let path = Self::rows_path(&insert.table_name);
        self.client.post_json(&path, &insert, cancel).await
    }
}

/// Drops tables named by [`QueryResult::DropTable`] models
#[derive(Debug, Clone)]
pub struct ApiDropHandler {
    client: ApiClient,
}

impl ApiDropHandler {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryHandler for ApiDropHandler {
    fn name(&self) -> &str {
        "api-drop"
    }

    fn can_handle(&self, model: &QueryResult) -> bool {
        matches!(model, QueryResult::DropTable(_))
    }

    async fn handle(
        &self,
        model: QueryResult,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, HandlerError> {
        let drop = match model {
            QueryResult::DropTable(drop) => drop,
            other => return Ok(DispatchResponse::unsupported(other.type_name())),
        };
        self.client.post_json("/tables/drop", &drop, cancel).await
    }
}

/// Dispatcher with the table, insert and drop handlers sharing one client
pub fn api_dispatcher(client: ApiClient) -> QueryDispatcher {
    QueryDispatcher::default()
        .with_handler(ApiTableHandler::new(client.clone()))
        .with_handler(ApiInsertHandler::new(client.clone()))
        .with_handler(ApiDropHandler::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTableModel, DropTableModel, InsertModel};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::runtime::Runtime;
    use tokio::task::JoinHandle;

    fn runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    /// Serve one HTTP exchange and hand back the raw request text
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[test]
    fn test_handlers_accept_their_variant_only() {
        let client = ApiClient::new("http://localhost", None, 5).unwrap();
        let create: QueryResult = CreateTableModel::new("t").into();
        let insert: QueryResult = InsertModel::new("t", vec![]).into();
        let drop: QueryResult = DropTableModel::new(vec!["t".to_string()]).into();

        let table = ApiTableHandler::new(client.clone());
        let rows = ApiInsertHandler::new(client.clone());
        let dropper = ApiDropHandler::new(client);

        assert!(table.can_handle(&create));
        assert!(!table.can_handle(&insert));
        assert!(rows.can_handle(&insert));
        assert!(!rows.can_handle(&drop));
        assert!(dropper.can_handle(&drop));
        assert!(!dropper.can_handle(&create));
    }

    #[test]
    fn test_base_url_trailing_slash_and_encoded_table() {
        let client = ApiClient::new("http://localhost:8080/api/", None, 5).unwrap();
        assert_eq!(client.url("/tables"), "http://localhost:8080/api/tables");
        assert_eq!(
            ApiInsertHandler::rows_path("my table"),
            "/tables/my%20table/rows"
        );
    }

    #[test]
    fn test_insert_posts_json_with_token() {
        runtime().block_on(async {
            let (base_url, server) = serve_once("201 Created", "rows stored").await;
            let client = ApiClient::new(base_url, Some("secret".to_string()), 5).unwrap();
            let mut model = InsertModel::new("orders", vec!["id".to_string()]);
            model.push_value(Some("1".to_string()));

            let response = ApiInsertHandler::new(client)
                .handle(model.into(), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(response, DispatchResponse::ok("rows stored"));
            let request = server.await.unwrap();
            assert!(request.starts_with("POST /tables/orders/rows "));
            assert!(request.to_lowercase().contains("authorization: bearer secret"));
            assert!(request.contains("\"tableName\":\"orders\""));
        });
    }

    #[test]
    fn test_non_success_status_is_backend_error() {
        runtime().block_on(async {
            let (base_url, server) = serve_once("500 Internal Server Error", "boom").await;
            let client = ApiClient::new(base_url, None, 5).unwrap();

            let result = ApiTableHandler::new(client)
                .handle(CreateTableModel::new("t").into(), &CancellationToken::new())
                .await;

            match result {
                Err(HandlerError::Backend { status, body }) => {
                    assert_eq!(status, 500);
                    assert_eq!(body, "boom");
                }
                other => panic!("Expected backend error, got {:?}", other),
            }
            server.await.unwrap();
        });
    }

    #[test]
    fn test_cancelled_token_skips_request() {
        runtime().block_on(async {
            let client = ApiClient::new("http://127.0.0.1:9", None, 5).unwrap();
            let cancel = CancellationToken::new();
            cancel.cancel();

            let result = ApiDropHandler::new(client)
                .handle(
                    DropTableModel::new(vec!["t".to_string()]).into(),
                    &cancel,
                )
                .await;

            assert!(matches!(result, Err(HandlerError::Cancelled)));
        });
    }

    #[test]
    fn test_api_dispatcher_registers_all_handlers() {
        let client = ApiClient::new("http://localhost", None, 5).unwrap();
        let names: Vec<_> = api_dispatcher(client)
            .handlers()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["api-table", "api-insert", "api-drop"]);
    }
}
