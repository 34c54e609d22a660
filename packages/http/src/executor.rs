//! HTTP execution abstraction.
//!
//! The store never talks to reqwest directly; it hands fully-formed requests
//! to an [`HttpExecutor`], which lets tests substitute a mock and observe
//! exactly which requests were issued.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use crate::error::Error;
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Implementations can use real HTTP clients or mock responses for testing.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Any response that arrives, whatever its status, is `Ok`. `Err` is
    /// reserved for requests that produced no response at all.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Production HTTP executor using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create a new executor. `None` means requests have no deadline.
    pub fn new(timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method: http::Method = request.method.into();
        let url = url::Url::parse(&request.url)?;

        let mut req_builder = self.client.request(method, url);
        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text().await?;
        trace!(status, bytes = body_text.len(), "response received");

        Ok(HttpResponse::from_parts(status, headers, body_text))
    }
}

/// Mock HTTP executor for testing.
///
/// Returns predefined responses based on request matching.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::types::Method;
    use std::sync::{Arc, Mutex};

    type Handler = dyn Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync;

    /// A mock HTTP executor that returns predefined responses.
    ///
    /// Matching order: method and URL, URL only, the handler, the default
    /// response, and finally a 404.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Responses keyed by method and URL.
        method_responses: Arc<Mutex<HashMap<(Method, String), HttpResponse>>>,
        /// Responses keyed by URL.
        responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
        handler: Option<Arc<Handler>>,
        /// Default response when no match found.
        default_response: Arc<Mutex<Option<HttpResponse>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        /// Error message when failing every request.
        error_message: Arc<Mutex<Option<String>>>,
    }

    impl MockExecutor {
        /// Create a new mock executor.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a specific URL.
        pub fn with_response(self, url: impl Into<String>, response: HttpResponse) -> Self {
            self.responses.lock().unwrap().insert(url.into(), response);
            self
        }

        /// Add a response for a specific method and URL.
        pub fn with_method_response(
            self,
            method: Method,
            url: impl Into<String>,
            response: HttpResponse,
        ) -> Self {
            self.method_responses
                .lock()
                .unwrap()
                .insert((method, url.into()), response);
            self
        }

        /// Compute responses dynamically. Returning `None` falls through.
        pub fn with_handler<F>(mut self, handler: F) -> Self
        where
            F: Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync + 'static,
        {
            self.handler = Some(Arc::new(handler));
            self
        }

        /// Set a default response when no path matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.error_message.lock().unwrap() = Some(message.into());
            self
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// Clear recorded requests.
        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// Create a simple success response.
        pub fn success_response(body: serde_json::Value) -> HttpResponse {
            HttpResponse::from_parts(200, HashMap::new(), body.to_string())
        }

        /// Create a success response wrapped in the store's result envelope.
        pub fn envelope_response(result: serde_json::Value) -> HttpResponse {
            Self::success_response(serde_json::json!({"ok": true, "result": result}))
        }

        /// Create a simple error response.
        pub fn error_response(status: u16, message: &str) -> HttpResponse {
            HttpResponse::from_parts(
                status,
                HashMap::new(),
                serde_json::json!({"ok": false, "error": message}).to_string(),
            )
        }

        /// Create a 404 Not Found response.
        pub fn not_found() -> HttpResponse {
            Self::error_response(404, "Not Found")
        }

        fn respond(&self, request: &HttpRequest) -> HttpResponse {
            let key = (request.method, request.url.clone());
            if let Some(response) = self.method_responses.lock().unwrap().get(&key) {
                return response.clone();
            }

            if let Some(response) = self.responses.lock().unwrap().get(&request.url) {
                return response.clone();
            }

            if let Some(handler) = &self.handler {
                if let Some(response) = handler(request) {
                    return response;
                }
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                return response.clone();
            }

            Self::not_found()
        }
    }

    #[async_trait]
    impl HttpExecutor for MockExecutor {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.error_message.lock().unwrap().clone() {
                return Err(Error::Transport { message });
            }

            Ok(self.respond(&request))
        }
    }
}
