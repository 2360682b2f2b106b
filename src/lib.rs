//! # openapi-txn
//!
//! **openapi-txn** is the per-request core of an OpenAPI-driven HTTP service: it turns one
//! matched request into one response, bounded in time, with strict input coercion and
//! content negotiation.
//!
//! ## Overview
//!
//! A transport adapter parses the wire request, a router resolves it to an operation, and this
//! crate does everything in between:
//!
//! - **[`coercion`]** - Converts string-typed path/query/header/cookie values into typed JSON
//!   values; numbers must restringify to exactly the input text
//! - **[`negotiation`]** - Derives the request body spec from `Content-Type`/`Content-Length` and
//!   negotiates response charsets and media types from `Accept-Charset`/`Accept`
//! - **[`dispatcher`]** - Binds parameters, decodes the body and invokes the handler, enforcing
//!   the minimal `{ status, headers, body }` response contract
//! - **[`transaction`]** - Lifecycle of each exchange: unique id, registry of pending
//!   transactions, time budget, error-to-response mapping, exactly-once delivery
//! - **[`server`]** - Transport-agnostic request/response types plus health and diagnostics
//!   responses
//! - **[`spec`]** - Operation contracts and route matches supplied by the router
//! - **[`config`]** / **[`otel`]** - Runtime settings and structured logging
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport adapter
//!     participant M as TransactionManager
//!     participant N as negotiation
//!     participant D as dispatcher
//!     participant H as Handler
//!
//!     T->>M: run(request, route_match, handler)
//!     M->>M: create(): id, registry entry, timer
//!     M->>N: extract_body_spec / extract_response_spec
//!     N-->>M: BodySpec, ResponseSpec (or 406/415)
//!     M->>D: bind_parameters + decode_body
//!     D-->>M: HandlerParameters (or 400/413)
//!     M->>D: execute_handler
//!     D->>H: call(parameters, operation)
//!     H-->>D: HandlerReply::Deferred
//!     D-->>M: TransactionResponse
//!     M->>M: end() on success, catch() + end_failed() on error
//!     M-->>T: TransactionResponse (or 504 if the timer won)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use openapi_txn::dispatcher::handler_fn;
//! use openapi_txn::server::TransactionRequest;
//! use openapi_txn::spec::{OperationContract, ParameterLocation, ParameterSchema, RouteMatch, SchemaType};
//! use openapi_txn::transaction::TransactionManager;
//! use openapi_txn::TransactionConfig;
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let _logging = openapi_txn::otel::init_logging_with_config(&openapi_txn::otel::LogConfig::from_env())?;
//!     let manager = TransactionManager::new(TransactionConfig::from_env());
//!
//!     let operation = OperationContract::new("getPet", Method::GET, "/pets/{id}")
//!         .produces(["application/json"], &["utf-8"])
//!         .with_parameter("id", ParameterLocation::Path, true, ParameterSchema::of(SchemaType::Number));
//!     let handler = Arc::new(handler_fn(|params| async move {
//!         Ok(json!({ "status": 200, "body": { "id": params.get("id"), "name": "Rex" } }))
//!     }));
//!
//!     let route = RouteMatch::new(Arc::new(operation)).with_path_param("id", "42");
//!     let response = manager
//!         .run(TransactionRequest::new(Method::GET, "/pets/42"), route, handler)
//!         .await;
//!     println!("{}", response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime Considerations
//!
//! Transactions run on the tokio runtime. [`transaction::TransactionManager::create`] spawns the
//! timeout task, so it must be called from within a runtime. Handlers that outlive their time
//! budget are not cancelled; their late result is dropped.

pub mod coercion;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod negotiation;
pub mod otel;
pub mod server;
pub mod spec;
pub mod transaction;

pub use config::TransactionConfig;
pub use error::{ErrorCode, TransactionError};
pub use ids::TransactionId;
pub use server::{TransactionRequest, TransactionResponse};
pub use spec::{OperationContract, ParameterLocation, ParameterMeta, RouteMatch};
pub use transaction::{Transaction, TransactionManager, TransactionState};
