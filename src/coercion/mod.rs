//! # Coercion Module
//!
//! Pure functions turning the string values found in paths, query strings, headers
//! and cookies into typed values. JSON bodies are never coerced; they go through
//! the body decoder instead.
//!
//! ## Reentrancy
//!
//! With [`CoercionOptions::strictly_reentrant`] enabled (the default), a number is
//! accepted only if rendering the parsed value back to a string reproduces the
//! input exactly. `"007"`, `"1e1"` and `"1.0"` are rejected with
//! `E_NON_REENTRANT_NUMBER`.
//!
//! ```rust
//! use openapi_txn::coercion::{parse_number, CoercionOptions};
//!
//! let options = CoercionOptions::default();
//! assert_eq!(parse_number(&options, "42").unwrap(), 42.0);
//! assert!(parse_number(&options, "042").is_err());
//! ```
//!
//! Booleans are equally strict: only the literals `"true"` and `"false"` parse.

mod core;

pub use core::*;
