//! Proxied request execution.
//!
//! Every execution, successful or not, produces exactly one history entry.
//! History write failures are logged and never change the returned envelope.

use super::page::first_page;
use super::types::{ProxyResponse, RequestMethod, RequestSpec};
use super::upstream::{redact_auth, UpstreamClient, UpstreamReply};
use crate::error::TransportError;
use crate::store::{blocking, HistoryEntry, HistoryStore};

#[derive(Clone)]
pub struct Executor {
    upstream: UpstreamClient,
    history: HistoryStore,
}

impl Executor {
    pub fn new(upstream: UpstreamClient, history: HistoryStore) -> Self {
        Self { upstream, history }
    }

    /// Forwards a validated request and wraps the outcome in an envelope.
    pub async fn execute(&self, spec: &RequestSpec, auth_token: &str) -> ProxyResponse {
        let outcome = self
            .upstream
            .send(
                spec.method,
                &spec.endpoint,
                &spec.headers,
                spec.body.as_ref(),
                auth_token,
            )
            .await;

        self.finish(spec, outcome).await
    }

    /// GETs the file endpoint and narrows a successful reply to its first page.
    ///
    /// History records the `PAGE` label and the endpoint as submitted.
    pub async fn fetch_first_page(&self, spec: &RequestSpec, auth_token: &str) -> ProxyResponse {
        let outcome = self
            .upstream
            .send(
                RequestMethod::Page,
                &spec.endpoint,
                &spec.headers,
                None,
                auth_token,
            )
            .await
            .map(|mut reply| {
                if reply.is_success() {
                    reply.data = first_page(&reply.data);
                }
                reply
            });

        let spec = RequestSpec {
            method: RequestMethod::Page,
            ..spec.clone()
        };
        self.finish(&spec, outcome).await
    }

    async fn finish(
        &self,
        spec: &RequestSpec,
        outcome: Result<UpstreamReply, TransportError>,
    ) -> ProxyResponse {
        let entry = HistoryEntry::new(spec.method, spec.endpoint.clone())
            .with_request(redact_auth(&spec.headers), spec.body_text());

        let (response, entry) = match outcome {
            Ok(reply) => {
                tracing::debug!(
                    method = %spec.method,
                    endpoint = %spec.endpoint,
                    status = reply.status,
                    "Upstream replied"
                );
                let entry = entry.with_response(reply.status, &reply.data);
                (
                    ProxyResponse::success(reply.status, reply.data, reply.headers),
                    entry,
                )
            }
            Err(err) => {
                tracing::warn!(
                    method = %spec.method,
                    endpoint = %spec.endpoint,
                    code = err.code(),
                    error = %err,
                    "Upstream request failed"
                );
                let message = err.to_string();
                (
                    ProxyResponse::error(message.clone(), err.code().to_string()),
                    entry.with_error(message),
                )
            }
        };

        let history = self.history.clone();
        if let Err(e) = blocking(move || history.append(&entry)).await {
            tracing::warn!(error = %e, endpoint = %spec.endpoint, "Failed to record history");
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn executor_with_timeout(base_url: &str, timeout_ms: u64) -> (Executor, HistoryStore) {
        let history = HistoryStore::new(Arc::new(Database::in_memory().unwrap()), 100);
        let upstream = UpstreamClient::new(base_url, timeout_ms).unwrap();
        (Executor::new(upstream, history.clone()), history)
    }

    fn executor(base_url: &str) -> (Executor, HistoryStore) {
        executor_with_timeout(base_url, 2000)
    }

    fn spec(method: RequestMethod, endpoint: &str) -> RequestSpec {
        RequestSpec {
            method,
            endpoint: endpoint.to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_non_2xx_is_a_successful_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/files/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":404,"err":"Not found"}"#)
            .create_async()
            .await;

        let (executor, history) = executor(&server.url());
        let response = executor
            .execute(&spec(RequestMethod::Get, "/files/missing"), "token")
            .await;

        assert!(!response.error);
        assert_eq!(response.status_code, Some(404));
        assert_eq!(response.data, Some(json!({"status": 404, "err": "Not found"})));

        let entries = history.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status_code, Some(404));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_yields_error_and_one_entry() {
        let (executor, history) = executor("http://127.0.0.1:1");
        let response = executor.execute(&spec(RequestMethod::Get, "/me"), "token").await;

        assert!(response.error);
        assert!(!response.message.as_deref().unwrap_or_default().is_empty());
        assert_eq!(response.status_code, None);

        let entries = history.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status_code, None);
        assert!(entries[0].error.is_some());
    }

    #[tokio::test]
    async fn test_malformed_body_is_local_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/files/abc/comments")
            .expect(0)
            .create_async()
            .await;

        let (executor, history) = executor(&server.url());
        let mut request = spec(RequestMethod::Post, "/files/abc/comments");
        request.body = Some(json!("{not json"));
        let response = executor.execute(&request, "token").await;

        mock.assert_async().await;
        assert!(response.error);
        assert_eq!(response.code.as_deref(), Some("INVALID_BODY"));
        assert_eq!(history.list().unwrap()[0].body.as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn test_first_page_narrowed_and_labelled() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/files/abc")
            .match_header("x-figma-token", "token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "name": "Design",
                    "document": {"children": [{"id": "A"}, {"id": "B"}, {"id": "C"}]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (executor, history) = executor(&server.url());
        let response = executor
            .fetch_first_page(&spec(RequestMethod::Page, "/files/abc"), "token")
            .await;

        mock.assert_async().await;
        assert_eq!(response.status_code, Some(200));
        assert_eq!(response.data, Some(json!({"id": "A"})));

        let entries = history.list().unwrap();
        assert_eq!(entries[0].method, RequestMethod::Page);
        assert_eq!(entries[0].endpoint, "/files/abc");
    }

    #[tokio::test]
    async fn test_first_page_passes_through_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/files/abc")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":403,"err":"Invalid token"}"#)
            .create_async()
            .await;

        let (executor, _) = executor(&server.url());
        let response = executor
            .fetch_first_page(&spec(RequestMethod::Get, "/files/abc"), "bad")
            .await;

        assert_eq!(response.status_code, Some(403));
        assert_eq!(response.data, Some(json!({"status": 403, "err": "Invalid token"})));
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let (executor, history) = executor_with_timeout(&format!("http://{addr}"), 300);
        let response = executor.execute(&spec(RequestMethod::Get, "/me"), "token").await;
        silent.abort();

        assert!(response.error);
        assert_eq!(response.code.as_deref(), Some("TIMEOUT"));
        assert_eq!(response.message.as_deref(), Some("Request timed out after 300 ms"));

        let entries = history.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].error.as_deref(), Some("Request timed out after 300 ms"));
    }

    #[tokio::test]
    async fn test_history_failure_keeps_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"handle":"designer"}"#)
            .create_async()
            .await;

        let db = Arc::new(Database::in_memory().unwrap());
        db.lock()
            .unwrap()
            .execute_batch("DROP TABLE request_history")
            .unwrap();
        let history = HistoryStore::new(db, 100);

        let reachable = Executor::new(
            UpstreamClient::new(server.url(), 2000).unwrap(),
            history.clone(),
        );
        let response = reachable.execute(&spec(RequestMethod::Get, "/me"), "token").await;
        assert!(!response.error);
        assert_eq!(response.status_code, Some(200));
        assert_eq!(response.data, Some(json!({"handle": "designer"})));

        let unreachable = Executor::new(
            UpstreamClient::new("http://127.0.0.1:1", 2000).unwrap(),
            history.clone(),
        );
        let response = unreachable.execute(&spec(RequestMethod::Get, "/me"), "token").await;
        assert!(response.error);
        assert_eq!(response.code.as_deref(), Some("CONNECTION_FAILED"));

        assert!(history.list().is_err());
    }
}
