//! # Dispatcher Module
//!
//! The dispatcher prepares the inputs of a matched business handler, invokes it and
//! enforces the minimal response contract.
//!
//! ## Overview
//!
//! - [`bind_parameters`] reads every declared parameter from its location (path values
//!   from the router, query string, headers, cookies) and coerces it through the
//!   [`coercion`](crate::coercion) library.
//! - [`decode_body`] checks the body against `Content-Length` and the configured limit,
//!   then parses JSON, decodes text, or keeps raw bytes.
//! - [`execute_handler`] calls the [`Handler`] and validates what it resolves to.
//!
//! ## Handler Contract
//!
//! A handler must reply with a deferred computation ([`HandlerReply::Deferred`]). Once
//! awaited it resolves to a JSON object shaped like:
//!
//! ```json
//! { "status": 200, "headers": { "x-request": "abc" }, "body": { "id": 1 } }
//! ```
//!
//! | Outcome | Error |
//! |---------|-------|
//! | immediate value instead of a deferred reply | `E_NO_RESPONSE_PROMISE` (500) |
//! | resolves to `null`, `false`, `0` or `""` | `E_NO_RESPONSE` (500) |
//! | no numeric `status` | `E_NO_RESPONSE_STATUS` (500) |
//! | header value neither string nor list of strings | `E_BAD_RESPONSE_HEADER` (500) |
//!
//! `headers` default to an empty map. Errors returned by the handler itself are not
//! caught: they propagate to the [`transaction`](crate::transaction) manager, which maps
//! them onto a response.
//!
//! ```rust,no_run
//! use openapi_txn::dispatcher::{handler_fn, HandlerParameters};
//! use serde_json::json;
//!
//! let get_pet = handler_fn(|params: HandlerParameters| async move {
//!     let id = params.get("id").cloned().unwrap_or_default();
//!     Ok(json!({ "status": 200, "body": { "id": id, "name": "Rex" } }))
//! });
//! # let _ = get_pet;
//! ```

mod body;
mod core;
mod params;

pub use body::{decode_body, RequestBody};
pub use core::{
    execute_handler, handler_fn, response_from_value, Handler, HandlerFn, HandlerFuture,
    HandlerParameters, HandlerReply,
};
pub use params::bind_parameters;
