//! The store handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jsonstore_http::{HttpExecutor, HttpRequest, Method, ReqwestExecutor};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::pending::{cancelled_ping, cancelled_reply, Pending, PendingReply};
use crate::reply::Reply;

/// A handle to one token's namespace in the remote store.
///
/// Every network operation comes in two forms. `*_async` issues the request
/// immediately and returns a [`PendingReply`]; the plain form issues the same
/// request and blocks until it resolves. Remote failures resolve as
/// [`Reply::NotFound`] or [`Reply::Failure`]; only local misuse (a destroyed
/// handle, an empty path) is returned as `Err`.
///
/// Clones share the same instance, including its destroyed state.
///
/// # Example
///
/// ```ignore
/// use jsonstore::{JsonStore, Reply};
///
/// let store = JsonStore::new(None)?;
/// store.put("players/1", &serde_json::json!({"coins": 0}))?;
///
/// match store.get("players/1")? {
///     Reply::Value(player) => println!("{player}"),
///     Reply::NotFound => println!("no such player"),
///     Reply::Failure(message) => eprintln!("store unavailable: {message}"),
/// }
/// ```
#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<Inner>,
}

struct Inner {
    address: Address,
    executor: Arc<dyn HttpExecutor>,
    runtime: StoreRuntime,
    destroyed: AtomicBool,
}

enum StoreRuntime {
    Owned(OwnedRuntime),
    Shared(Handle),
}

/// A runtime private to one store.
///
/// Every spawned request holds a clone of `in_flight`; the runtime is only
/// torn down once all of them have finished.
struct OwnedRuntime {
    runtime: Option<Runtime>,
    in_flight: Option<mpsc::Sender<()>>,
    drained: Option<mpsc::Receiver<()>>,
}

impl StoreRuntime {
    fn owned(worker_threads: usize) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("jsonstore-worker")
            .enable_all()
            .build()?;
        let (in_flight, drained) = mpsc::channel(1);
        Ok(StoreRuntime::Owned(OwnedRuntime {
            runtime: Some(runtime),
            in_flight: Some(in_flight),
            drained: Some(drained),
        }))
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match self {
            StoreRuntime::Owned(OwnedRuntime {
                runtime: Some(runtime),
                in_flight: Some(in_flight),
                ..
            }) => {
                let in_flight = in_flight.clone();
                runtime.spawn(async move {
                    task.await;
                    drop(in_flight);
                });
            }
            StoreRuntime::Owned(_) => unreachable!("runtime is only taken on drop"),
            StoreRuntime::Shared(handle) => {
                handle.spawn(task);
            }
        }
    }
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        let (Some(runtime), Some(mut drained)) = (self.runtime.take(), self.drained.take()) else {
            return;
        };
        drop(self.in_flight.take());

        // Dropping a runtime blocks, which panics inside an async context, so
        // requests already issued are drained on a thread of their own.
        let drain = std::thread::Builder::new()
            .name("jsonstore-shutdown".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let _ = drained.recv().await;
                });
            });
        if let Err(e) = drain {
            warn!(error = %e, "could not drain in-flight requests");
        }
    }
}

/// Builder for [`JsonStore`].
#[derive(Default)]
pub struct JsonStoreBuilder {
    token: Option<String>,
    config: StoreConfig,
    executor: Option<Arc<dyn HttpExecutor>>,
    runtime: Option<Handle>,
}

impl JsonStoreBuilder {
    /// Use an existing token. Without one, a fresh token is generated.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Send requests through `executor` instead of a reqwest client.
    pub fn executor(mut self, executor: impl HttpExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Run requests on an existing runtime instead of an owned one.
    pub fn runtime_handle(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<JsonStore, StoreError> {
        let endpoint = self.config.endpoint_url()?;
        let generated = self.token.is_none();
        let address = Address::new(endpoint, self.token)?;
        if generated {
            debug!(endpoint = address.endpoint(), "generated store token");
        }

        let executor: Arc<dyn HttpExecutor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(ReqwestExecutor::new(self.config.timeout())?),
        };

        let runtime = match self.runtime {
            Some(handle) => StoreRuntime::Shared(handle),
            None => StoreRuntime::owned(self.config.worker_threads)?,
        };

        Ok(JsonStore {
            inner: Arc::new(Inner {
                address,
                executor,
                runtime,
                destroyed: AtomicBool::new(false),
            }),
        })
    }
}

impl JsonStore {
    /// A store on the default endpoint, honoring `JSONSTORE_URL`.
    pub fn new(token: Option<String>) -> Result<Self, StoreError> {
        let builder = Self::builder().config(StoreConfig::from_env()?);
        match token {
            Some(token) => builder.token(token).build(),
            None => builder.build(),
        }
    }

    pub fn builder() -> JsonStoreBuilder {
        JsonStoreBuilder::default()
    }

    /// The base endpoint URL, without a trailing slash.
    pub fn url(&self) -> &str {
        self.inner.address.endpoint()
    }

    /// The token, optionally prefixed with the endpoint URL.
    pub fn token(&self, include_url: bool) -> String {
        self.inner.address.token(include_url)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Retire this instance. Idempotent.
    ///
    /// Requests already issued run to completion; anything issued afterwards
    /// fails with [`StoreError::Destroyed`].
    pub fn destroy(&self) {
        if !self.inner.destroyed.swap(true, Ordering::AcqRel) {
            info!(endpoint = self.url(), "store destroyed");
        }
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.is_destroyed() {
            Err(StoreError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Check that the service answers for this namespace.
    pub fn ping_async(&self) -> Result<Pending<bool>, StoreError> {
        self.guard()?;
        let request = HttpRequest::get(self.inner.address.namespace_url());
        let executor = self.inner.executor.clone();

        Ok(self.spawn(cancelled_ping, async move {
            let url = request.url.clone();
            match executor.execute(request).await {
                Ok(response) => {
                    debug!(%url, status = response.status, "ping");
                    response.is_success()
                }
                Err(e) => {
                    debug!(%url, error = %e, "ping failed");
                    false
                }
            }
        }))
    }

    pub fn ping(&self) -> Result<bool, StoreError> {
        Ok(self.ping_async()?.wait())
    }

    pub fn get_async(&self, path: &str) -> Result<PendingReply, StoreError> {
        self.guard()?;
        let url = self.inner.address.path_url(path)?;
        Ok(self.dispatch(HttpRequest::get(url)))
    }

    pub fn get(&self, path: &str) -> Result<Reply, StoreError> {
        Ok(self.get_async(path)?.wait())
    }

    /// Delete the value at `path`. Resolves to `Value(true)` on success.
    pub fn delete_async(&self, path: &str) -> Result<PendingReply, StoreError> {
        self.guard()?;
        let url = self.inner.address.path_url(path)?;
        Ok(self.dispatch(HttpRequest::delete(url)))
    }

    pub fn delete(&self, path: &str) -> Result<Reply, StoreError> {
        Ok(self.delete_async(path)?.wait())
    }

    /// Replace the value at `path`. Resolves to the content accepted.
    pub fn put_async(&self, path: &str, value: impl Serialize) -> Result<PendingReply, StoreError> {
        self.write_async(Method::PUT, path, value)
    }

    pub fn put(&self, path: &str, value: impl Serialize) -> Result<Reply, StoreError> {
        Ok(self.put_async(path, value)?.wait())
    }

    /// POST `value` at `path`; merge/append semantics are the service's.
    pub fn post_async(
        &self,
        path: &str,
        value: impl Serialize,
    ) -> Result<PendingReply, StoreError> {
        self.write_async(Method::POST, path, value)
    }

    pub fn post(&self, path: &str, value: impl Serialize) -> Result<Reply, StoreError> {
        Ok(self.post_async(path, value)?.wait())
    }

    /// Read `path`, storing `default` first if nothing is there.
    ///
    /// Resolves to the existing value, or to `default` once it has been
    /// written. A failed read resolves to that failure and writes nothing.
    ///
    /// The read and the write are separate requests. Two callers racing on
    /// the same absent path may both write their default; the service keeps
    /// whichever write lands last.
    pub fn get_default_async(
        &self,
        path: &str,
        default: impl Serialize,
    ) -> Result<PendingReply, StoreError> {
        self.guard()?;
        let url = self.inner.address.path_url(path)?;
        let default = serde_json::to_value(default)?;
        let executor = self.inner.executor.clone();

        Ok(self.spawn(cancelled_reply, async move {
            match execute(executor.as_ref(), HttpRequest::get(url.clone())).await {
                Reply::NotFound => {
                    let put = HttpRequest::put(url).with_json_body(default.clone());
                    match execute(executor.as_ref(), put).await {
                        Reply::Value(_) => Reply::Value(default),
                        Reply::NotFound => Reply::Failure(
                            "default could not be written: path not found".to_string(),
                        ),
                        failure => failure,
                    }
                }
                existing => existing,
            }
        }))
    }

    pub fn get_default(&self, path: &str, default: impl Serialize) -> Result<Reply, StoreError> {
        Ok(self.get_default_async(path, default)?.wait())
    }

    fn write_async(
        &self,
        method: Method,
        path: &str,
        value: impl Serialize,
    ) -> Result<PendingReply, StoreError> {
        self.guard()?;
        let url = self.inner.address.path_url(path)?;
        let body = serde_json::to_value(value)?;
        let request = HttpRequest {
            method,
            url,
            body: Some(body),
        };
        Ok(self.dispatch(request))
    }

    fn dispatch(&self, request: HttpRequest) -> PendingReply {
        let executor = self.inner.executor.clone();
        self.spawn(cancelled_reply, async move {
            execute(executor.as_ref(), request).await
        })
    }

    fn spawn<T, F>(&self, on_cancel: fn() -> T, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: std::future::Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.inner.runtime.spawn(async move {
            // The caller may have dropped its handle.
            let _ = tx.send(task.await);
        });
        Pending::new(rx, on_cancel)
    }
}

/// Issue one request and interpret the response.
async fn execute(executor: &dyn HttpExecutor, request: HttpRequest) -> Reply {
    let method = request.method;
    let url = request.url.clone();
    let sent: Option<Value> = request.body.clone();

    match executor.execute(request).await {
        Ok(response) => {
            let reply = Reply::from_response(method, &response, sent.as_ref());
            debug!(%method, %url, status = response.status, outcome = outcome(&reply), "request resolved");
            reply
        }
        Err(e) => {
            debug!(%method, %url, error = %e, "request failed");
            Reply::Failure(e.to_string())
        }
    }
}

fn outcome(reply: &Reply) -> &'static str {
    match reply {
        Reply::Value(_) => "value",
        Reply::NotFound => "not_found",
        Reply::Failure(_) => "failure",
    }
}

impl std::fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore")
            .field("url", &self.url())
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
