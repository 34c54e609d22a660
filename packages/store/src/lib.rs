//! # jsonstore
//!
//! Client for a remote, path-addressed JSON store.
//!
//! A [`JsonStore`] is bound to one token; values live at
//! `{endpoint}/{token}/{path}`. Every operation has an async form returning a
//! [`PendingReply`] and a blocking form returning the [`Reply`] directly:
//!
//! ```ignore
//! use jsonstore::{JsonStore, Reply};
//! use serde_json::json;
//!
//! let store = JsonStore::new(Some("my-token".into()))?;
//!
//! // Blocking
//! let settings = store.get_default("settings", json!({"music": true}))?;
//!
//! // Async
//! let reply = store.get_async("players/1")?.await;
//! if let Reply::NotFound = reply {
//!     store.put_async("players/1", json!({"coins": 0}))?.await;
//! }
//!
//! store.destroy();
//! ```
//!
//! Remote outcomes are never errors: they resolve as [`Reply::Value`],
//! [`Reply::NotFound`] or [`Reply::Failure`]. [`StoreError`] is reserved for
//! local misuse, such as calling into a destroyed store.

mod address;
pub mod config;
mod error;
mod pending;
mod reply;
mod store;

pub use address::generate_token;
pub use config::StoreConfig;
pub use error::{ReplyError, StoreError};
pub use pending::{Pending, PendingReply};
pub use reply::Reply;
pub use store::{JsonStore, JsonStoreBuilder};

pub use jsonstore_http::{HttpExecutor, HttpRequest, HttpResponse, Method, ReqwestExecutor};
