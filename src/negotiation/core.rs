use super::accept::{preferred_charsets, preferred_media_types};
use crate::error::{ErrorCode, TransactionError};
use crate::server::TransactionRequest;
use crate::spec::OperationContract;
use http::header::{ACCEPT, ACCEPT_CHARSET, CONTENT_LENGTH, CONTENT_TYPE};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_CHARSET: &str = "utf-8";

/// Declared metadata of an incoming request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodySpec {
    /// Media type essence (`type/subtype`, lowercase); empty when no body is declared
    pub content_type: String,
    pub content_length: u64,
    pub charset: String,
    pub boundary: Option<String>,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_length: 0,
            charset: DEFAULT_CHARSET.to_string(),
            boundary: None,
        }
    }
}

/// Negotiated response capabilities, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResponseSpec {
    pub charsets: Vec<String>,
    pub content_types: Vec<String>,
}

fn parse_content_length(request: &TransactionRequest) -> Result<u64, TransactionError> {
    let mut values = request.headers.get_all(CONTENT_LENGTH).iter();
    // Without the header (e.g. a de-chunked body) the body read off the wire is authoritative.
    let Some(first) = values.next() else {
        return Ok(request.body.as_ref().map_or(0, |body| body.len() as u64));
    };
    let raw = first.to_str().unwrap_or_default().trim();
    let parsed = raw
        .parse::<u64>()
        .map_err(|_| TransactionError::new(ErrorCode::BadContentLength, [raw]))?;
    // Repeated headers are only tolerated when they agree.
    for other in values {
        if other.to_str().ok().map(str::trim) != Some(raw) {
            return Err(TransactionError::new(ErrorCode::BadContentLength, [raw]));
        }
    }
    Ok(parsed)
}

fn media_type_matches(consumable: &str, content_type: &str) -> bool {
    let consumable = consumable
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if consumable == "*/*" || consumable == "*" {
        return true;
    }
    match consumable.strip_suffix("/*") {
        Some(main) => content_type
            .split_once('/')
            .is_some_and(|(ct_main, _)| ct_main == main),
        None => consumable == content_type,
    }
}

/// Derive the body metadata of a request and check it against what the operation consumes.
///
/// Charset and media-type checks only apply when `Content-Length` is positive; an
/// empty body is never rejected for a content-type mismatch.
pub fn extract_body_spec(
    request: &TransactionRequest,
    consumable_media_types: &[String],
    consumable_charsets: &[String],
) -> Result<BodySpec, TransactionError> {
    let mut spec = BodySpec {
        content_length: parse_content_length(request)?,
        ..BodySpec::default()
    };

    if let Some(value) = request.headers.get(CONTENT_TYPE) {
        let raw = value.to_str().unwrap_or_default();
        let parsed = mime::Mime::from_str(raw)
            .map_err(|_| TransactionError::new(ErrorCode::BadContentType, [raw]))?;
        spec.content_type = parsed.essence_str().to_ascii_lowercase();
        if let Some(charset) = parsed.get_param(mime::CHARSET) {
            spec.charset = charset.as_str().to_ascii_lowercase();
        }
        spec.boundary = parsed
            .get_param(mime::BOUNDARY)
            .map(|b| b.as_str().to_string());
    }

    if spec.content_length > 0 {
        if !consumable_charsets
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&spec.charset))
        {
            debug!(charset = %spec.charset, consumable = ?consumable_charsets, "Unsupported request charset");
            return Err(TransactionError::new(
                ErrorCode::UnsupportedCharset,
                [spec.charset.clone(), consumable_charsets.join(",")],
            ));
        }
        if !consumable_media_types
            .iter()
            .any(|m| media_type_matches(m, &spec.content_type))
        {
            debug!(content_type = %spec.content_type, consumable = ?consumable_media_types, "Unsupported request media type");
            return Err(TransactionError::new(
                ErrorCode::UnsupportedMediaType,
                [spec.content_type.clone(), consumable_media_types.join(",")],
            ));
        }
    }

    Ok(spec)
}

/// Negotiate acceptable response charsets and media types.
///
/// `*/*` segments of `Accept` are rewritten to the match-all `*`; a missing header
/// accepts anything.
#[must_use]
pub fn extract_response_spec(
    operation: &OperationContract,
    request: &TransactionRequest,
    supported_media_types: &[String],
    supported_charsets: &[String],
) -> ResponseSpec {
    let charsets = match request.joined_header(ACCEPT_CHARSET) {
        Some(accept_charset) => preferred_charsets(&accept_charset, supported_charsets),
        None => supported_charsets.to_vec(),
    };

    let accept = request
        .joined_header(ACCEPT)
        .map(|accept| normalize_accept(&accept))
        .unwrap_or_else(|| "*".to_string());
    let content_types = preferred_media_types(&accept, supported_media_types);

    debug!(
        operation_id = %operation.operation_id,
        accept = %accept,
        charsets = ?charsets,
        content_types = ?content_types,
        "Response spec negotiated"
    );

    ResponseSpec {
        charsets,
        content_types,
    }
}

fn normalize_accept(accept: &str) -> String {
    accept
        .split(',')
        .map(|segment| {
            let trimmed = segment.trim_start();
            match trimmed.strip_prefix("*/*") {
                Some(rest) if rest.is_empty() || rest.trim_start().starts_with(';') => {
                    format!("*{rest}")
                }
                _ => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn check_response_media_type(
    request: &TransactionRequest,
    response_spec: &ResponseSpec,
    producible_media_types: &[String],
) -> Result<(), TransactionError> {
    if response_spec.content_types.is_empty() {
        let accept = request.joined_header(ACCEPT).unwrap_or_default();
        return Err(TransactionError::new(
            ErrorCode::UnacceptableMediaType,
            [accept, producible_media_types.join(",")],
        ));
    }
    Ok(())
}

pub fn check_response_charset(
    request: &TransactionRequest,
    response_spec: &ResponseSpec,
    producible_charsets: &[String],
) -> Result<(), TransactionError> {
    if response_spec.charsets.is_empty() {
        let accept_charset = request.joined_header(ACCEPT_CHARSET).unwrap_or_default();
        return Err(TransactionError::new(
            ErrorCode::UnacceptableCharset,
            [
                accept_charset,
                response_spec.charsets.join(","),
                producible_charsets.join(","),
            ],
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accept() {
        assert_eq!(normalize_accept("*/*"), "*");
        assert_eq!(normalize_accept("text/html, */*;q=0.1"), "text/html,*;q=0.1");
        assert_eq!(normalize_accept("text/*"), "text/*");
    }

    #[test]
    fn test_media_type_matches() {
        assert!(media_type_matches("application/json", "application/json"));
        assert!(media_type_matches("Application/JSON; charset=utf-8", "application/json"));
        assert!(media_type_matches("*/*", "image/png"));
        assert!(media_type_matches("text/*", "text/plain"));
        assert!(!media_type_matches("text/*", "application/json"));
        assert!(!media_type_matches("application/xml", "application/json"));
    }
}
