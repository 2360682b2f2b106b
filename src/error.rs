//! # Error Module
//!
//! Every failure surfaced by the transaction core is a [`TransactionError`]: a stable,
//! machine-readable [`ErrorCode`] plus the offending parameters. Errors never carry
//! free text only, so the transaction manager can map them onto a response body and
//! operators can correlate them in logs.
//!
//! ## Status mapping
//!
//! | Status | Codes |
//! |--------|-------|
//! | 400 | `E_BAD_CONTENT_TYPE`, `E_BAD_CONTENT_LENGTH`, `E_BAD_BODY_LENGTH`, `E_BAD_BODY`, `E_REQUIRED_PARAMETER` |
//! | 400 | coercion codes once bound to a parameter |
//! | 406 | `E_UNSUPPORTED_CHARSET`, `E_UNACCEPTABLE_MEDIA_TYPE`, `E_UNACCEPTABLE_CHARSET` |
//! | 413 | `E_REQUEST_CONTENT_TOO_LARGE` |
//! | 415 | `E_UNSUPPORTED_MEDIA_TYPE` |
//! | 500 | `E_NO_RESPONSE_PROMISE`, `E_NO_RESPONSE`, `E_NO_RESPONSE_STATUS`, `E_BAD_RESPONSE_HEADER`, `E_UNEXPECTED` |
//! | 504 | `E_TRANSACTION_TIMEOUT` |
//!
//! Wrappers (CORS and the like) attach headers with [`TransactionError::with_header`]
//! instead of mutating an opaque error after the fact.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::fmt;

/// Stable error codes understood by clients and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadContentType,
    BadContentLength,
    BadBodyLength,
    BadBody,
    RequestContentTooLarge,
    UnsupportedCharset,
    UnsupportedMediaType,
    UnacceptableMediaType,
    UnacceptableCharset,
    RequiredParameter,
    NonReentrantNumber,
    BadNumber,
    BadInteger,
    BadBoolean,
    NoResponsePromise,
    NoResponse,
    NoResponseStatus,
    BadResponseHeader,
    TransactionTimeout,
    Unexpected,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadContentType => "E_BAD_CONTENT_TYPE",
            ErrorCode::BadContentLength => "E_BAD_CONTENT_LENGTH",
            ErrorCode::BadBodyLength => "E_BAD_BODY_LENGTH",
            ErrorCode::BadBody => "E_BAD_BODY",
            ErrorCode::RequestContentTooLarge => "E_REQUEST_CONTENT_TOO_LARGE",
            ErrorCode::UnsupportedCharset => "E_UNSUPPORTED_CHARSET",
            ErrorCode::UnsupportedMediaType => "E_UNSUPPORTED_MEDIA_TYPE",
            ErrorCode::UnacceptableMediaType => "E_UNACCEPTABLE_MEDIA_TYPE",
            ErrorCode::UnacceptableCharset => "E_UNACCEPTABLE_CHARSET",
            ErrorCode::RequiredParameter => "E_REQUIRED_PARAMETER",
            ErrorCode::NonReentrantNumber => "E_NON_REENTRANT_NUMBER",
            ErrorCode::BadNumber => "E_BAD_NUMBER",
            ErrorCode::BadInteger => "E_BAD_INTEGER",
            ErrorCode::BadBoolean => "E_BAD_BOOLEAN",
            ErrorCode::NoResponsePromise => "E_NO_RESPONSE_PROMISE",
            ErrorCode::NoResponse => "E_NO_RESPONSE",
            ErrorCode::NoResponseStatus => "E_NO_RESPONSE_STATUS",
            ErrorCode::BadResponseHeader => "E_BAD_RESPONSE_HEADER",
            ErrorCode::TransactionTimeout => "E_TRANSACTION_TIMEOUT",
            ErrorCode::Unexpected => "E_UNEXPECTED",
        }
    }

    /// Status used when the error does not carry an explicit one.
    #[must_use]
    pub fn default_status(&self) -> StatusCode {
        match self {
            ErrorCode::BadContentType
            | ErrorCode::BadContentLength
            | ErrorCode::BadBodyLength
            | ErrorCode::BadBody
            | ErrorCode::RequiredParameter => StatusCode::BAD_REQUEST,
            ErrorCode::UnsupportedCharset
            | ErrorCode::UnacceptableMediaType
            | ErrorCode::UnacceptableCharset => StatusCode::NOT_ACCEPTABLE,
            ErrorCode::RequestContentTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorCode::TransactionTimeout => StatusCode::GATEWAY_TIMEOUT,
            // Coercion codes have no status of their own until a parameter binds them.
            ErrorCode::NonReentrantNumber
            | ErrorCode::BadNumber
            | ErrorCode::BadInteger
            | ErrorCode::BadBoolean
            | ErrorCode::NoResponsePromise
            | ErrorCode::NoResponse
            | ErrorCode::NoResponseStatus
            | ErrorCode::BadResponseHeader
            | ErrorCode::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ErrorCode::BadContentType => "malformed Content-Type header",
            ErrorCode::BadContentLength => "malformed Content-Length header",
            ErrorCode::BadBodyLength => "body length does not match Content-Length",
            ErrorCode::BadBody => "request body could not be decoded",
            ErrorCode::RequestContentTooLarge => "request body exceeds the configured limit",
            ErrorCode::UnsupportedCharset => "request charset is not consumable",
            ErrorCode::UnsupportedMediaType => "request media type is not consumable",
            ErrorCode::UnacceptableMediaType => "no producible media type matches Accept",
            ErrorCode::UnacceptableCharset => "no producible charset matches Accept-Charset",
            ErrorCode::RequiredParameter => "required parameter is missing",
            ErrorCode::NonReentrantNumber => "number is not in its canonical form",
            ErrorCode::BadNumber => "value is not a finite number",
            ErrorCode::BadInteger => "value is not an integer",
            ErrorCode::BadBoolean => "value is neither \"true\" nor \"false\"",
            ErrorCode::NoResponsePromise => "handler did not return a deferred reply",
            ErrorCode::NoResponse => "handler resolved to an empty response",
            ErrorCode::NoResponseStatus => "handler response has no numeric status",
            ErrorCode::BadResponseHeader => "handler response carries an invalid header",
            ErrorCode::TransactionTimeout => "transaction exceeded its time budget",
            ErrorCode::Unexpected => "unexpected handler failure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure raised by any pipeline stage.
#[derive(Debug)]
pub struct TransactionError {
    code: ErrorCode,
    params: Vec<String>,
    status: Option<StatusCode>,
    headers: HeaderMap,
    source: Option<anyhow::Error>,
}

impl TransactionError {
    pub fn new<I, S>(code: ErrorCode, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code,
            params: params.into_iter().map(Into::into).collect(),
            status: None,
            headers: HeaderMap::new(),
            source: None,
        }
    }

    /// Wrap an arbitrary handler failure.
    ///
    /// A `TransactionError` raised by the handler itself (through `anyhow`) is recovered
    /// as-is so its status and headers survive; anything else becomes `E_UNEXPECTED`.
    #[must_use]
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<TransactionError>() {
            Ok(err) => err,
            Err(other) => Self {
                code: ErrorCode::Unexpected,
                params: vec![other.to_string()],
                status: None,
                headers: HeaderMap::new(),
                source: Some(other),
            },
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Attach a header to be copied onto the error response.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| self.code.default_status())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        self.code.description()
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.code.description())?;
        if !self.params.is_empty() {
            write!(f, " ({})", self.params.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| {
            let inner: &(dyn std::error::Error + 'static) = e.as_ref();
            inner
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_mapping() {
        assert_eq!(
            TransactionError::new(ErrorCode::BadContentType, ["x"]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TransactionError::new(ErrorCode::UnsupportedMediaType, ["x"]).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            TransactionError::new(ErrorCode::TransactionTimeout, Vec::<String>::new()).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_explicit_status_wins() {
        let err = TransactionError::new(ErrorCode::BadBoolean, ["yes"])
            .with_status(StatusCode::BAD_REQUEST);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::BadBoolean);
    }

    #[test]
    fn test_from_handler_recovers_transaction_error() {
        let original = TransactionError::new(ErrorCode::RequiredParameter, ["id"])
            .with_header(
                http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        let recovered = TransactionError::from_handler(anyhow::Error::new(original));
        assert_eq!(recovered.code(), ErrorCode::RequiredParameter);
        assert_eq!(recovered.headers().len(), 1);
    }

    #[test]
    fn test_from_handler_wraps_opaque_error() {
        let err = TransactionError::from_handler(anyhow::anyhow!("database down"));
        assert_eq!(err.code(), ErrorCode::Unexpected);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.params(), ["database down"]);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_includes_code_and_params() {
        let err = TransactionError::new(ErrorCode::BadBoolean, ["yes"]);
        let text = err.to_string();
        assert!(text.starts_with("E_BAD_BOOLEAN"));
        assert!(text.contains("yes"));
    }
}
