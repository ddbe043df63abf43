//! Explicit request context and reply
//!
//! The server engine never reads ambient state. Whatever HTTP layer hosts it
//! builds a [`RequestContext`] from the incoming request and writes back the
//! [`Reply`], if any.

use jrpc_core::Headers;

/// Everything the engine needs to know about one incoming request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// HTTP method, when the host knows it; anything but POST is refused
    pub http_method: Option<String>,
    /// Request URI: path plus optional query string
    pub uri: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RequestContext {
    /// A context carrying only a body
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// A POST request to `/` with the given body
    pub fn post(body: impl Into<Vec<u8>>) -> Self {
        Self::new(body).with_method("POST").with_uri("/")
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = Some(method.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The URI without its query string
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    /// The raw query string, if any
    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    /// First value of a query parameter, percent-decoded
    ///
    /// A bare key (`?smd`) yields an empty string.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_param(name).is_some()
    }

    /// Whether the request may carry calls
    pub fn is_post(&self) -> bool {
        match &self.http_method {
            Some(method) => method.eq_ignore_ascii_case("POST"),
            None => true,
        }
    }

    /// The payload to decode: a non-empty `rawRequest` query parameter wins
    /// over the body
    pub fn payload(&self) -> Vec<u8> {
        match self.query_param("rawRequest") {
            Some(raw) if !raw.is_empty() => raw.into_bytes(),
            _ => self.body.clone(),
        }
    }
}

/// What the host writes back
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub headers: Headers,
    pub body: String,
}

impl Reply {
    /// Value of the first header with the given name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parsing() {
        let ctx = RequestContext::post("").with_uri("/api/rpc?smd&rawRequest=%7B%22a%22%3A1%7D");

        assert_eq!(ctx.path(), "/api/rpc");
        assert!(ctx.has_query_param("smd"));
        assert_eq!(ctx.query_param("rawRequest").as_deref(), Some(r#"{"a":1}"#));
        assert!(!ctx.has_query_param("other"));
    }

    #[test]
    fn test_raw_request_overrides_body() {
        let ctx = RequestContext::post("body").with_uri("/?rawRequest=query");
        assert_eq!(ctx.payload(), b"query".to_vec());

        let ctx = RequestContext::post("body").with_uri("/?rawRequest=");
        assert_eq!(ctx.payload(), b"body".to_vec());
    }

    #[test]
    fn test_method_check() {
        assert!(RequestContext::new("").is_post());
        assert!(RequestContext::new("").with_method("post").is_post());
        assert!(!RequestContext::new("").with_method("GET").is_post());
    }

    #[test]
    fn test_reply_header_lookup() {
        let reply = Reply {
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: String::new(),
        };
        assert_eq!(reply.header("content-type"), Some("application/json"));
        assert_eq!(reply.header("Access-Control-Allow-Origin"), None);
    }
}
