#![allow(dead_code)]

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Method};
use openapi_txn::dispatcher::{handler_fn, Handler, HandlerParameters, RequestBody};
use openapi_txn::spec::{OperationContract, ParameterLocation, ParameterSchema, RouteMatch, SchemaType};
use openapi_txn::TransactionRequest;
use serde_json::{json, Value};
use std::sync::Arc;

/// Route test logs through the libtest capture; safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `PUT /pets/{id}` consuming and producing JSON, with one parameter per location.
pub fn pet_operation() -> OperationContract {
    OperationContract::new("putPet", Method::PUT, "/pets/{id}")
        .consumes(["application/json"], &["utf-8"])
        .produces(["application/json", "text/plain"], &["utf-8"])
        .with_parameter("id", ParameterLocation::Path, true, ParameterSchema::of(SchemaType::Integer))
        .with_parameter("verbose", ParameterLocation::Query, false, ParameterSchema::of(SchemaType::Boolean))
        .with_parameter("x-tags", ParameterLocation::Header, false, ParameterSchema::array_of(SchemaType::String))
        .with_parameter("session", ParameterLocation::Cookie, false, ParameterSchema::of(SchemaType::String))
}

pub fn pet_route(id: &str) -> RouteMatch {
    RouteMatch::new(Arc::new(pet_operation())).with_path_param("id", id)
}

/// Request carrying `body` as JSON with a matching `Content-Length`.
pub fn json_request(method: Method, path: &str, body: &Value) -> TransactionRequest {
    let bytes = body.to_string().into_bytes();
    TransactionRequest::new(method, path)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .with_header(CONTENT_LENGTH, HeaderValue::from(bytes.len()))
        .with_body(bytes)
}

/// Handler answering 200 with the parameters and body it received.
pub fn echo_handler() -> Arc<dyn Handler> {
    Arc::new(handler_fn(|params: HandlerParameters| async move {
        let body = params
            .body
            .as_ref()
            .and_then(RequestBody::as_json)
            .cloned()
            .unwrap_or(Value::Null);
        Ok(json!({
            "status": 200,
            "headers": { "x-transaction": params.transaction_id.to_string() },
            "body": { "params": params.values, "body": body },
        }))
    }))
}
