use super::body::RequestBody;
use crate::error::{ErrorCode, TransactionError};
use crate::ids::TransactionId;
use crate::negotiation::{BodySpec, ResponseSpec};
use crate::server::TransactionResponse;
use crate::spec::OperationContract;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a handler receives besides the operation contract.
#[derive(Debug, Clone)]
pub struct HandlerParameters {
    /// Correlation id of the owning transaction
    pub transaction_id: TransactionId,
    /// Coerced path/query/header/cookie parameters keyed by declared name
    pub values: Map<String, Value>,
    /// Decoded request body, if any
    pub body: Option<RequestBody>,
    pub body_spec: BodySpec,
    pub response_spec: ResponseSpec,
}

impl HandlerParameters {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Output of a handler: `{ "status": u16, "headers"?: {..}, "body"?: .. }`.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// What a handler hands back when called.
///
/// Only [`HandlerReply::Deferred`] is a valid reply; the pipeline awaits it. An
/// immediate value means the handler broke the asynchronous contract and the
/// invocation fails with `E_NO_RESPONSE_PROMISE`.
pub enum HandlerReply {
    Deferred(HandlerFuture),
    Immediate(Value),
}

impl HandlerReply {
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        HandlerReply::Deferred(Box::pin(future))
    }
}

impl std::fmt::Debug for HandlerReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerReply::Deferred(_) => f.write_str("HandlerReply::Deferred(..)"),
            HandlerReply::Immediate(value) => {
                f.debug_tuple("HandlerReply::Immediate").field(value).finish()
            }
        }
    }
}

/// Business handler bound to an operation.
pub trait Handler: Send + Sync {
    fn call(&self, parameters: HandlerParameters, operation: &OperationContract) -> HandlerReply;
}

/// Adapter turning an async closure into a [`Handler`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`].
///
/// ```rust
/// use openapi_txn::dispatcher::handler_fn;
/// use serde_json::json;
///
/// let handler = handler_fn(|params| async move {
///     Ok(json!({ "status": 200, "body": { "id": params.get("id") } }))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(HandlerParameters) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(HandlerParameters) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn call(&self, parameters: HandlerParameters, _operation: &OperationContract) -> HandlerReply {
        HandlerReply::deferred((self.f)(parameters))
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn status_of(value: &Value) -> Option<u16> {
    let status = match value.get("status")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))?,
        _ => return None,
    };
    (100..=999)
        .contains(&status)
        .then_some(status as u16)
}

fn headers_of(value: Option<&Value>) -> Result<HeaderMap, TransactionError> {
    let mut headers = HeaderMap::new();
    let entries = match value {
        None | Some(Value::Null) => return Ok(headers),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(TransactionError::new(
                ErrorCode::BadResponseHeader,
                ["headers".to_string(), other.to_string()],
            ))
        }
    };
    for (name, raw) in entries {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            TransactionError::new(ErrorCode::BadResponseHeader, [name.clone(), raw.to_string()])
        })?;
        let values: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        for item in values {
            let text = match item {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(TransactionError::new(
                        ErrorCode::BadResponseHeader,
                        [name.clone(), raw.to_string()],
                    ))
                }
            };
            let header_value = HeaderValue::from_str(&text).map_err(|_| {
                TransactionError::new(ErrorCode::BadResponseHeader, [name.clone(), text.clone()])
            })?;
            headers.append(header_name.clone(), header_value);
        }
    }
    Ok(headers)
}

/// Check the shape of a resolved handler value and turn it into a response.
pub fn response_from_value(value: Value) -> Result<TransactionResponse, TransactionError> {
    if is_empty_value(&value) {
        return Err(TransactionError::new(ErrorCode::NoResponse, [value.to_string()]));
    }
    let status = status_of(&value).ok_or_else(|| {
        TransactionError::new(
            ErrorCode::NoResponseStatus,
            [value.get("status").map(Value::to_string).unwrap_or_default()],
        )
    })?;
    let headers = headers_of(value.get("headers"))?;
    let body = match value {
        Value::Object(mut map) => map.remove("body").filter(|b| !b.is_null()),
        _ => None,
    };
    Ok(TransactionResponse::new(status, headers, body))
}

/// Invoke the handler and enforce the minimal response contract.
///
/// Handler errors are not caught here; they propagate (wrapped as
/// [`TransactionError`]) to the transaction manager.
pub async fn execute_handler(
    operation: &OperationContract,
    handler: &dyn Handler,
    parameters: HandlerParameters,
) -> Result<TransactionResponse, TransactionError> {
    let transaction_id = parameters.transaction_id;

    info!(
        transaction_id = %transaction_id,
        operation_id = %operation.operation_id,
        method = %operation.method,
        path = %operation.path,
        "Handler execution start"
    );

    let future = match handler.call(parameters, operation) {
        HandlerReply::Deferred(future) => future,
        HandlerReply::Immediate(_) => {
            return Err(TransactionError::new(
                ErrorCode::NoResponsePromise,
                [
                    operation.operation_id.clone(),
                    operation.method.to_string(),
                    operation.path.clone(),
                ],
            ));
        }
    };

    let execution_start = Instant::now();
    let value = future.await.map_err(TransactionError::from_handler)?;
    let response = response_from_value(value)?;

    debug!(
        transaction_id = %transaction_id,
        operation_id = %operation.operation_id,
        status = response.status,
        execution_time_ms = execution_start.elapsed().as_millis() as u64,
        "Handler execution complete"
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_from_value_defaults_headers() {
        let resp = response_from_value(json!({"status": 200})).unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.headers.is_empty());
        assert_eq!(resp.body, None);
    }

    #[test]
    fn test_response_from_value_rejects_empty_and_statusless() {
        for empty in [json!(null), json!(false), json!(0), json!("")] {
            assert_eq!(
                response_from_value(empty).unwrap_err().code(),
                ErrorCode::NoResponse
            );
        }
        for statusless in [json!({}), json!({"status": "200"}), json!({"status": 42}), json!([1])] {
            assert_eq!(
                response_from_value(statusless).unwrap_err().code(),
                ErrorCode::NoResponseStatus
            );
        }
    }

    #[test]
    fn test_response_from_value_headers() {
        let resp = response_from_value(json!({
            "status": 201.0,
            "headers": { "location": "/pets/1", "x-tags": ["a", "b"], "x-count": 2 },
            "body": { "id": 1 }
        }))
        .unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(resp.get_header("location"), Some("/pets/1"));
        assert_eq!(resp.headers.get_all("x-tags").iter().count(), 2);
        assert_eq!(resp.get_header("x-count"), Some("2"));
        assert_eq!(resp.body, Some(json!({"id": 1})));

        let err = response_from_value(json!({"status": 200, "headers": {"bad name": "x"}}))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadResponseHeader);
    }
}
