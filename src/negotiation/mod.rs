//! # Negotiation Module
//!
//! Enforces the content constraints an operation declares against the actual request
//! and derives what the response may look like.
//!
//! ## Overview
//!
//! - [`extract_body_spec`] reads `Content-Length` and `Content-Type` and, when a body is
//!   present, checks its charset (406) and media type (415) against what the operation
//!   consumes.
//! - [`extract_response_spec`] negotiates `Accept-Charset` and `Accept` against what the
//!   operation produces, ordered by client preference.
//! - [`check_response_media_type`] and [`check_response_charset`] fail with 406 when
//!   negotiation left nothing acceptable.
//!
//! All functions are pure; they share no state and are safe to call from any number of
//! concurrent transactions.
//!
//! ```rust
//! use http::{header, HeaderValue, Method};
//! use openapi_txn::negotiation::extract_body_spec;
//! use openapi_txn::server::TransactionRequest;
//!
//! let request = TransactionRequest::new(Method::POST, "/pets")
//!     .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"))
//!     .with_header(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
//! let spec = extract_body_spec(
//!     &request,
//!     &["application/json".to_string()],
//!     &["utf-8".to_string()],
//! )
//! .unwrap();
//! assert_eq!(spec.content_type, "application/json");
//! assert_eq!(spec.content_length, 42);
//! ```

mod accept;
mod core;

pub use accept::{preferred_charsets, preferred_media_types};
pub use core::*;
