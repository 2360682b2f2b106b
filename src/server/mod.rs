//! # Server Module
//!
//! Transport-facing types. A transport adapter (hyper, may_minihttp, a test harness)
//! turns its native request into a [`TransactionRequest`], awaits the transaction, and
//! writes the resulting [`TransactionResponse`] back out, usually via
//! [`TransactionResponse::into_http`].
//!
//! [`health_endpoint`] and [`diagnostics_endpoint`] are ready-made responses adapters
//! can mount next to their routes.

pub mod request;
pub mod response;
pub mod service;

pub use request::{parse_cookies, parse_query_params, TransactionRequest};
pub use response::TransactionResponse;
pub use service::{diagnostics_endpoint, health_endpoint};
