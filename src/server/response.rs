use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::Value;

/// Transport-agnostic response handed back to the transport adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    pub headers: HeaderMap,
    /// Response body; strings are written as text, everything else as JSON
    pub body: Option<Value>,
}

impl TransactionResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: Option<Value>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status,
            headers,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Convert into an `http::Response` for transport adapters built on the `http` crate.
    #[must_use]
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let TransactionResponse {
            status,
            mut headers,
            body,
        } = self;
        let declared_json = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_media_type);
        let bytes = match body {
            None => Vec::new(),
            Some(Value::String(s)) if !declared_json => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static("text/plain; charset=utf-8"),
                    );
                }
                s.into_bytes()
            }
            Some(other) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                serde_json::to_vec(&other).unwrap_or_default()
            }
        };
        let mut response = http::Response::new(bytes);
        *response.status_mut() =
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *response.headers_mut() = headers;
        response
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_http_json_body() {
        let resp = TransactionResponse::new(201, HeaderMap::new(), Some(json!({"id": 1})))
            .into_http();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(resp.body(), br#"{"id":1}"#);
    }

    #[test]
    fn test_into_http_text_body_keeps_explicit_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        let resp = TransactionResponse::new(200, headers, Some(json!("a,b"))).into_http();
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/csv");
        assert_eq!(resp.body(), b"a,b");
    }

    #[test]
    fn test_into_http_empty_body() {
        let resp = TransactionResponse::new(204, HeaderMap::new(), None).into_http();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(resp.body().is_empty());
        assert!(resp.headers().is_empty());
    }

    #[test]
    fn test_into_http_string_body_declared_json() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let resp = TransactionResponse::new(200, headers, Some(json!("pong"))).into_http();
        assert_eq!(resp.body(), br#""pong""#);
    }
}
