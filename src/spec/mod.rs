//! Operation contract types supplied by the routing collaborator.
//!
//! The transaction core never discovers or stores routes; it only reads the
//! [`OperationContract`] of the matched operation and the raw path values in a
//! [`RouteMatch`].

mod types;

pub use types::*;
