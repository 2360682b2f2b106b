use crate::error::{ErrorCode, TransactionError};
use crate::negotiation::BodySpec;
use serde_json::Value;

/// Request body decoded according to its declared media type.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/json` and `+json` media types
    Json(Value),
    /// `text/*` media types in a supported charset
    Text(String),
    Binary(Vec<u8>),
}

impl RequestBody {
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

fn is_json(content_type: &str) -> bool {
    content_type == "application/json" || content_type.ends_with("+json")
}

fn decode_text(spec: &BodySpec, bytes: &[u8]) -> Result<Option<String>, TransactionError> {
    match spec.charset.as_str() {
        "utf-8" | "utf8" | "us-ascii" => String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|err| TransactionError::new(ErrorCode::BadBody, [err.to_string()])),
        "iso-8859-1" | "latin1" => Ok(Some(bytes.iter().map(|&b| char::from(b)).collect())),
        _ => Ok(None),
    }
}

/// Check the body against its declared length and the configured limit, then decode it.
///
/// The transport must hand over the whole body; a length differing from
/// `Content-Length` fails with `E_BAD_BODY_LENGTH`.
pub fn decode_body(
    spec: &BodySpec,
    body: Option<&[u8]>,
    max_body_length: u64,
) -> Result<Option<RequestBody>, TransactionError> {
    let bytes = body.unwrap_or_default();
    let actual = bytes.len() as u64;

    if spec.content_length > max_body_length || actual > max_body_length {
        return Err(TransactionError::new(
            ErrorCode::RequestContentTooLarge,
            [spec.content_length.max(actual).to_string(), max_body_length.to_string()],
        ));
    }
    if spec.content_length != actual {
        return Err(TransactionError::new(
            ErrorCode::BadBodyLength,
            [spec.content_length.to_string(), actual.to_string()],
        ));
    }
    if bytes.is_empty() {
        return Ok(None);
    }

    if is_json(&spec.content_type) {
        let value = serde_json::from_slice(bytes)
            .map_err(|err| TransactionError::new(ErrorCode::BadBody, [err.to_string()]))?;
        return Ok(Some(RequestBody::Json(value)));
    }
    if spec.content_type.starts_with("text/") {
        if let Some(text) = decode_text(spec, bytes)? {
            return Ok(Some(RequestBody::Text(text)));
        }
    }
    Ok(Some(RequestBody::Binary(bytes.to_vec())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    fn spec(content_type: &str, len: u64) -> BodySpec {
        BodySpec {
            content_type: content_type.to_string(),
            content_length: len,
            ..BodySpec::default()
        }
    }

    #[test]
    fn test_json_body() {
        let body = br#"{"name":"Rex"}"#;
        let decoded = decode_body(&spec("application/json", body.len() as u64), Some(&body[..]), 1024)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.as_json(), Some(&json!({"name": "Rex"})));
    }

    #[test]
    fn test_vendor_json_and_text() {
        let decoded = decode_body(&spec("application/problem+json", 2), Some(&b"[]"[..]), 1024).unwrap();
        assert_eq!(decoded, Some(RequestBody::Json(json!([]))));
        let decoded = decode_body(&spec("text/plain", 2), Some(&b"hi"[..]), 1024).unwrap();
        assert_eq!(decoded, Some(RequestBody::Text("hi".to_string())));
    }

    #[test]
    fn test_latin1_and_binary() {
        let mut latin = spec("text/plain", 1);
        latin.charset = "iso-8859-1".to_string();
        assert_eq!(
            decode_body(&latin, Some(&[0xe9u8][..]), 1024).unwrap(),
            Some(RequestBody::Text("é".to_string()))
        );
        assert_eq!(
            decode_body(&spec("image/png", 2), Some(&[1u8, 2][..]), 1024).unwrap(),
            Some(RequestBody::Binary(vec![1, 2]))
        );
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode_body(&BodySpec::default(), None, 1024).unwrap(), None);
    }

    #[test]
    fn test_bad_json() {
        let err = decode_body(&spec("application/json", 3), Some(&b"{x}"[..]), 1024).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadBody);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_length_mismatch_and_limit() {
        let err = decode_body(&spec("text/plain", 5), Some(&b"hi"[..]), 1024).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadBodyLength);
        assert_eq!(err.params(), ["5", "2"]);

        let err = decode_body(&spec("text/plain", 2), Some(&b"hi"[..]), 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RequestContentTooLarge);
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
