//! Token and URL addressing.
//!
//! Every value lives at `{endpoint}/{token}/{path}`.

use rand::RngCore;

use crate::error::StoreError;

const TOKEN_BYTES: usize = 32;

/// The endpoint/token pair a store instance is bound to. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Address {
    endpoint: String,
    token: String,
}

impl Address {
    /// `endpoint` must already be normalized (no trailing `/`).
    pub(crate) fn new(endpoint: String, token: Option<String>) -> Result<Self, StoreError> {
        let token = match token {
            Some(token) => {
                validate_token(&token)?;
                token
            }
            None => generate_token(),
        };

        Ok(Self { endpoint, token })
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn token(&self, include_url: bool) -> String {
        if include_url {
            self.namespace_url()
        } else {
            self.token.clone()
        }
    }

    pub(crate) fn namespace_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.token)
    }

    /// Full URL for `path`. Leading slashes are ignored.
    pub(crate) fn path_url(&self, path: &str) -> Result<String, StoreError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(StoreError::EmptyPath);
        }

        Ok(format!("{}/{}", self.namespace_url(), path))
    }
}

/// A fresh 64-character hex token from the thread-local CSPRNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn validate_token(token: &str) -> Result<(), StoreError> {
    let invalid = |message: &str| StoreError::InvalidToken {
        token: token.to_string(),
        message: message.to_string(),
    };

    if token.is_empty() {
        return Err(invalid("token must not be empty"));
    }
    if let Some(c) = token.chars().find(|c| matches!(c, '/' | '?' | '#')) {
        return Err(invalid(&format!("token must not contain {c:?}")));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(invalid("token must not contain whitespace"));
    }

    Ok(())
}
