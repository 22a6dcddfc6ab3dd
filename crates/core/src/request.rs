//! Request descriptions
//!
//! A [`RequestSpec`] is an immutable description of one HTTP request. It is
//! built once by the caller, validated, and consumed by submit.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST, requires a body
    Post,
}

impl Method {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    /// Parse a method name, case-insensitively
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(Error::configuration(format!(
                "unsupported method '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one request to make
///
/// `timeout` of `None` means the engine default applies; the manager itself
/// never enforces a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    url: String,
    method: Method,
    body: Option<String>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// Create a request with the given method and no body
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            timeout: None,
            headers: Vec::new(),
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::Get)
    }

    /// POST request with a body
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(url, Method::Post).with_body(body)
    }

    /// Set the request body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a per-request timeout covering the whole transfer
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a request header. Headers are passed to the engine verbatim.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request body, if any
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Per-request timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Extra headers in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Check the preconditions of submit
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the URL is blank, a POST has no
    /// body, a header name is empty, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::configuration("url must not be empty"));
        }
        if self.method == Method::Post && self.body.is_none() {
            return Err(Error::configuration(format!(
                "POST to {} requires a body",
                self.url
            )));
        }
        if self.headers.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err(Error::configuration("header name must not be empty"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        Ok(())
    }
}
