use http::header::{AsHeaderName, IntoHeaderName};
use http::{HeaderMap, HeaderValue, Method};
use std::collections::HashMap;
use tracing::debug;

/// Transport-agnostic request handed over by the transport adapter.
///
/// The body, when present, has already been read off the socket; the core never
/// touches raw I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path, possibly including the query string
    pub path: String,
    /// HTTP headers, possibly multi-valued
    pub headers: HeaderMap,
    /// Raw request body
    pub body: Option<Vec<u8>>,
}

impl TransactionRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of a header, if present and valid visible ASCII.
    #[must_use]
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All values of a header joined by `,` (the list form of RFC 9110 §5.3).
    #[must_use]
    pub fn joined_header<K: AsHeaderName>(&self, name: K) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    /// Path with any query string stripped.
    #[must_use]
    pub fn path_only(&self) -> &str {
        self.path.split('?').next().unwrap_or("/")
    }

    #[must_use]
    pub fn query_params(&self) -> HashMap<String, String> {
        let params = parse_query_params(&self.path);
        debug!(param_count = params.len(), "Query params parsed");
        params
    }

    #[must_use]
    pub fn cookies(&self) -> HashMap<String, String> {
        self.headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|c| parse_cookies(c).into_iter())
            .collect()
    }
}

impl From<http::Request<Vec<u8>>> for TransactionRequest {
    fn from(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        Self {
            method: parts.method,
            path,
            headers: parts.headers,
            body: if body.is_empty() { None } else { Some(body) },
        }
    }
}

/// Parse a `Cookie` header value into name/value pairs.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((name, value))
        })
        .collect()
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
/// When a name repeats, the values are joined with `,` so array parameters can be sent
/// either as `?tags=a,b` or `?tags=a&tags=b`.
#[must_use]
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = HashMap::new();
    if let Some(pos) = path.find('?') {
        let query_str = &path[pos + 1..];
        for (k, v) in url::form_urlencoded::parse(query_str.as_bytes()) {
            params
                .entry(k.into_owned())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&v);
                })
                .or_insert_with(|| v.into_owned());
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d");
        assert_eq!(cookies.get("a"), Some(&"b".to_string()));
        assert_eq!(cookies.get("c"), Some(&"d".to_string()));
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=2");
        assert_eq!(q.get("x"), Some(&"1".to_string()));
        assert_eq!(q.get("y"), Some(&"2".to_string()));
    }

    #[test]
    fn test_parse_query_params_repeated_and_encoded() {
        let q = parse_query_params("/p?tag=a&tag=b%20c");
        assert_eq!(q.get("tag"), Some(&"a,b c".to_string()));
        assert!(parse_query_params("/p").is_empty());
    }

    #[test]
    fn test_joined_header_and_path_only() {
        let req = TransactionRequest::new(Method::GET, "/pets?limit=1")
            .with_header("x-tags", HeaderValue::from_static("a"))
            .with_header("x-tags", HeaderValue::from_static("b"));
        assert_eq!(req.joined_header("x-tags").as_deref(), Some("a,b"));
        assert_eq!(req.header("x-tags"), Some("a"));
        assert_eq!(req.path_only(), "/pets");
        assert_eq!(req.joined_header("x-missing"), None);
    }

    #[test]
    fn test_from_http_request() {
        let req = http::Request::builder()
            .method(Method::POST)
            .uri("http://localhost/pets?x=1")
            .header("content-type", "application/json")
            .body(b"{}".to_vec())
            .unwrap();
        let req = TransactionRequest::from(req);
        assert_eq!(req.path, "/pets?x=1");
        assert_eq!(req.header(http::header::CONTENT_TYPE), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
    }
}
