//! # Transaction Module
//!
//! A transaction is the lifecycle of one HTTP exchange: it is created when the request
//! arrives, runs the negotiation/binding/handler pipeline, and ends exactly once, either
//! with the pipeline's response or with a `504 E_TRANSACTION_TIMEOUT` when its time
//! budget runs out first.
//!
//! ## Lifecycle
//!
//! ```text
//! create ──► Pending ──end─────────────────► Completed
//!               │    ──catch + end_failed──► Failed
//!               └────timer─────────────────► TimedOut
//! ```
//!
//! - [`TransactionManager::create`] registers the transaction, arms the timer and returns
//!   the [`Transaction`] handle plus the [`ResponseReceiver`] the transport awaits. The id
//!   comes from [`CORRELATION_HEADER`] when it carries an unused ULID, else it is fresh.
//! - [`Transaction::start`] runs the pipeline and returns `Result<_, TransactionError>`.
//! - [`Transaction::catch`] maps an error onto a JSON error response.
//! - [`Transaction::end`] delivers the response, cancels the timer and removes the
//!   registry entry. Any later `end`, and a timer firing afterwards, is a no-op.
//!   [`Transaction::end_failed`] does the same but records the `Failed` state.
//!
//! [`TransactionManager::run`] chains all of the above for transport adapters.
//!
//! ## Registry
//!
//! Each manager owns its own [`TransactionRegistry`]; nothing is global. Pending
//! transactions can be inspected through a read-only [`RegistryView`].
//!
//! ```rust,no_run
//! use openapi_txn::dispatcher::handler_fn;
//! use openapi_txn::server::TransactionRequest;
//! use openapi_txn::spec::{OperationContract, RouteMatch};
//! use openapi_txn::transaction::TransactionManager;
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let manager = TransactionManager::default();
//! let operation = OperationContract::new("ping", Method::GET, "/ping")
//!     .produces(["application/json"], &["utf-8"]);
//! let handler = Arc::new(handler_fn(|_| async { Ok(json!({ "status": 200, "body": "pong" })) }));
//!
//! let response = manager
//!     .run(
//!         TransactionRequest::new(Method::GET, "/ping"),
//!         RouteMatch::new(Arc::new(operation)),
//!         handler,
//!     )
//!     .await;
//! assert_eq!(response.status, 200);
//! # }
//! ```

mod core;
mod registry;

pub use core::{
    error_response, ResponseReceiver, Transaction, TransactionManager, TransactionState,
    CORRELATION_HEADER,
};
pub use registry::{RegistryView, TransactionEntry, TransactionRegistry};
