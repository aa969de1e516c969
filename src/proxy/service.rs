//! Proxy service abstraction layer.
//!
//! Provides a trait-based abstraction over validated execution, so routes can
//! be driven by a mock in tests.

use super::executor::Executor;
use super::types::{HeaderInput, PageRequest, ProxyRequest, ProxyResponse, RequestMethod};
use super::validator::{validate, validate_page};
use crate::error::ValidationError;
use crate::store::SavedRequest;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type ProxyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ProxyResponse, ValidationError>> + Send + 'a>>;

/// Trait for services that execute requests against the Figma API.
///
/// The access token is passed explicitly on every call.
pub trait ProxyService: Send + Sync {
    /// Validates and forwards a request.
    fn execute(&self, request: ProxyRequest, auth_token: Option<String>) -> ProxyFuture<'_>;

    /// Validates a file request and returns only its first page.
    fn fetch_first_page(&self, request: PageRequest, auth_token: Option<String>)
        -> ProxyFuture<'_>;
}

/// Default implementation backed by the upstream client and history store.
#[derive(Clone)]
pub struct FigmaProxyService {
    executor: Executor,
}

impl FigmaProxyService {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub fn arc(executor: Executor) -> Arc<Self> {
        Arc::new(Self::new(executor))
    }
}

impl ProxyService for FigmaProxyService {
    fn execute(&self, request: ProxyRequest, auth_token: Option<String>) -> ProxyFuture<'_> {
        Box::pin(async move {
            let spec = validate(request, auth_token.as_deref())?;
            let token = auth_token.unwrap_or_default();
            Ok(self.executor.execute(&spec, &token).await)
        })
    }

    fn fetch_first_page(
        &self,
        request: PageRequest,
        auth_token: Option<String>,
    ) -> ProxyFuture<'_> {
        Box::pin(async move {
            let spec = validate_page(request, auth_token.as_deref())?;
            let token = auth_token.unwrap_or_default();
            Ok(self.executor.fetch_first_page(&spec, &token).await)
        })
    }
}

/// Extension trait for `ProxyService` that replays stored templates.
pub trait ProxyServiceExt: ProxyService {
    /// Re-runs a saved request through the same validated path as a direct call.
    fn replay(&self, saved: &SavedRequest, auth_token: Option<String>) -> ProxyFuture<'_> {
        let headers = HeaderInput::from(saved.headers.clone());

        if saved.method == RequestMethod::Page {
            let request = PageRequest {
                endpoint: saved.endpoint.clone(),
                headers,
            };
            return self.fetch_first_page(request, auth_token);
        }

        let request = ProxyRequest {
            method: saved.method.to_string(),
            endpoint: saved.endpoint.clone(),
            headers,
            body: Some(Value::String(saved.body.clone())),
        };
        self.execute(request, auth_token)
    }
}

// Implement ProxyServiceExt for all types that implement ProxyService
impl<T: ProxyService + ?Sized> ProxyServiceExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records what it was asked to do and answers with a fixed envelope.
    #[derive(Default)]
    struct MockProxyService {
        calls: Mutex<Vec<(String, String, Option<Value>)>>,
    }

    impl ProxyService for MockProxyService {
        fn execute(&self, request: ProxyRequest, _auth_token: Option<String>) -> ProxyFuture<'_> {
            self.calls
                .lock()
                .unwrap()
                .push((request.method, request.endpoint, request.body));
            Box::pin(async move { Ok(ProxyResponse::success(200, json!({}), HashMap::new())) })
        }

        fn fetch_first_page(
            &self,
            request: PageRequest,
            _auth_token: Option<String>,
        ) -> ProxyFuture<'_> {
            self.calls
                .lock()
                .unwrap()
                .push(("PAGE".to_string(), request.endpoint, None));
            Box::pin(async move { Ok(ProxyResponse::success(200, json!({"id": "A"}), HashMap::new())) })
        }
    }

    fn saved(method: RequestMethod, endpoint: &str, body: &str) -> SavedRequest {
        SavedRequest {
            id: "1".to_string(),
            name: "saved".to_string(),
            method,
            endpoint: endpoint.to_string(),
            headers: HashMap::new(),
            body: body.to_string(),
            category: "Files".to_string(),
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_replay_routes_by_method() {
        let service = MockProxyService::default();

        service
            .replay(&saved(RequestMethod::Post, "/files/a/comments", r#"{"m":1}"#), None)
            .await
            .unwrap();
        service
            .replay(&saved(RequestMethod::Page, "/files/a", ""), None)
            .await
            .unwrap();

        let calls = service.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                "POST".to_string(),
                "/files/a/comments".to_string(),
                Some(json!(r#"{"m":1}"#))
            )
        );
        assert_eq!(calls[1], ("PAGE".to_string(), "/files/a".to_string(), None));
    }

    #[tokio::test]
    async fn test_validation_blocks_execution() {
        let history = crate::store::HistoryStore::new(
            Arc::new(crate::store::Database::in_memory().unwrap()),
            10,
        );
        let upstream = super::super::UpstreamClient::new("http://127.0.0.1:1", 1000).unwrap();
        let service = FigmaProxyService::new(Executor::new(upstream, history.clone()));

        let get = |endpoint: &str| ProxyRequest {
            method: "GET".to_string(),
            endpoint: endpoint.to_string(),
            headers: HeaderInput::default(),
            body: None,
        };

        let err = service
            .execute(get("/files/:file_key"), Some("token".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnresolvedPlaceholder(_)));

        let err = service.execute(get("/me"), None).await.unwrap_err();
        assert_eq!(err, ValidationError::MissingCredential);

        assert!(history.list().unwrap().is_empty());
    }
}
