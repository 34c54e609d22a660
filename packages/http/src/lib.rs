//! # jsonstore-http
//!
//! HTTP transport for the jsonstore client.
//!
//! The store core formats every request itself and hands it to an
//! [`HttpExecutor`]. This crate provides the request/response types, the
//! production [`ReqwestExecutor`], and (behind the `mock` feature) a
//! recording [`mock::MockExecutor`] for tests.
//!
//! ```ignore
//! use jsonstore_http::{HttpExecutor, HttpRequest, ReqwestExecutor};
//!
//! let executor = ReqwestExecutor::new(None)?;
//! let response = executor
//!     .execute(HttpRequest::get("https://www.jsonstore.io/{token}/users/1"))
//!     .await?;
//! assert!(response.is_success());
//! ```

pub mod error;
pub mod executor;
pub mod types;

pub use error::Error;
#[cfg(any(test, feature = "mock"))]
pub use executor::mock;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use types::{HttpRequest, HttpResponse, Method};
