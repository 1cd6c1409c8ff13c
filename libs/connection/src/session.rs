//! Request helpers bound to one base URL
//!
//! A [`Session`] joins endpoint paths onto the base URL, turns non-2xx answers
//! into [`MeteError::Server`] carrying the server's own explanation, and
//! decodes JSON bodies.

use serde_json::Value;
use std::sync::Arc;
use url::Url;

use common::{MeteError, MeteResult};

use crate::transport::{HttpRequest, Method, Transport};

/// Parse a user-supplied base URL
///
/// The path always ends with `/` so that relative endpoint paths are appended
/// instead of replacing the last segment.
pub fn normalize_base_url(raw: &str) -> MeteResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| MeteError::config(format!("Invalid base URL '{}': {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(MeteError::config(format!("'{}' cannot be used as a base URL", raw)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Percent-encode user input for use as a single path segment
///
/// `/`, `?` and `#` stay inside the segment instead of changing the endpoint.
/// `.` and `..` are rejected.
pub fn path_segment(raw: &str) -> MeteResult<String> {
    if raw.is_empty() || raw == "." || raw == ".." {
        return Err(MeteError::invalid_input(format!(
            "'{}' cannot be used in a URL path",
            raw
        )));
    }
    let mut scratch = Url::parse("http://segment.invalid/")
        .map_err(|e| MeteError::config(format!("Cannot encode '{}': {}", raw, e)))?;
    scratch
        .path_segments_mut()
        .map_err(|_| MeteError::config(format!("Cannot encode '{}'", raw)))?
        .pop_if_empty()
        .push(raw);
    Ok(scratch.path().trim_start_matches('/').to_string())
}

/// HTTP session for one base URL
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> MeteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| MeteError::config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Send a request and return the body of a successful response
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> MeteResult<String> {
        let mut request = HttpRequest::new(method, self.url(path)?).with_query(query);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        tracing::debug!("{} {}", request.method, request.url);
        let response = self.transport.send(request).await?;

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(MeteError::server(response.status, response.body))
        }
    }

    pub async fn get(&self, path: &str) -> MeteResult<Value> {
        let body = self.send(Method::Get, path, Vec::new(), None).await?;
        decode(path, &body)
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> MeteResult<Value> {
        let body = self.send(Method::Get, path, query, None).await?;
        decode(path, &body)
    }

    /// GET an endpoint only for its side effect
    pub async fn trigger(&self, path: &str, query: Vec<(String, String)>) -> MeteResult<()> {
        self.send(Method::Get, path, query, None).await?;
        Ok(())
    }

    pub async fn post(&self, path: &str, body: Value) -> MeteResult<Value> {
        let body = self.send(Method::Post, path, Vec::new(), Some(body)).await?;
        decode_optional(path, &body)
    }

    pub async fn patch(&self, path: &str, body: Value) -> MeteResult<()> {
        self.send(Method::Patch, path, Vec::new(), Some(body))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> MeteResult<()> {
        self.send(Method::Delete, path, Vec::new(), None).await?;
        Ok(())
    }
}

fn decode(path: &str, body: &str) -> MeteResult<Value> {
    serde_json::from_str(body)
        .map_err(|e| MeteError::malformed(format!("{} did not return valid JSON: {}", path, e)))
}

/// Write endpoints may answer with an empty body
fn decode_optional(path: &str, body: &str) -> MeteResult<Value> {
    if body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        decode(path, body)
    }
}
