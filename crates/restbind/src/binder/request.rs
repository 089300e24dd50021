//! Buffered view of an inbound request
//!
//! The body is read once by the dispatch loop so that every candidate route
//! sees the same request, even when earlier routes defer.

use crate::error::Result;
use crate::model::Mapping;
use crate::negotiate::AcceptPreference;
use crate::params::{extract_params, parse_form_params};
use axum::{
    body::Bytes,
    http::{header, request::Parts, HeaderMap, Method},
};

/// Request data available to route handlers.
#[derive(Debug, Clone)]
pub struct BoundRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl BoundRequest {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Declared `Content-Type`, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE)
    }

    /// Client format preference from `Accept`.
    pub fn accept(&self) -> AcceptPreference {
        AcceptPreference::parse(self.header(header::ACCEPT))
    }

    /// Query and urlencoded form parameters.
    pub fn form_params(&self) -> Result<Mapping> {
        parse_form_params(self.query(), self.content_type(), self.body())
    }

    /// Canonical attribute mapping for this request.
    pub fn params(&self) -> Result<Mapping> {
        extract_params(self.content_type(), self.body(), self.form_params()?)
    }
}
