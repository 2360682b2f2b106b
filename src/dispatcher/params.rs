use crate::coercion::{coerce_value, CoercionOptions};
use crate::error::{ErrorCode, TransactionError};
use crate::server::TransactionRequest;
use crate::spec::{ParameterLocation, ParameterMeta, RouteMatch};
use http::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

fn raw_value(
    param: &ParameterMeta,
    route: &RouteMatch,
    request: &TransactionRequest,
    query: &HashMap<String, String>,
    cookies: &HashMap<String, String>,
) -> Option<String> {
    match param.location {
        ParameterLocation::Path => route.get_path_param(&param.name).map(|raw| {
            urlencoding::decode(raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        }),
        ParameterLocation::Query => query.get(&param.name).cloned(),
        ParameterLocation::Header => request.joined_header(param.name.as_str()),
        ParameterLocation::Cookie => cookies.get(&param.name).cloned(),
    }
}

/// Read and coerce every parameter the matched operation declares.
///
/// Coercion failures keep their own code (`E_NON_REENTRANT_NUMBER`, `E_BAD_BOOLEAN`...)
/// but are surfaced as 400 with the parameter name appended to their params.
pub fn bind_parameters(
    route: &RouteMatch,
    request: &TransactionRequest,
    options: &CoercionOptions,
) -> Result<Map<String, Value>, TransactionError> {
    let parameters = &route.operation.parameters;
    let query = if parameters
        .iter()
        .any(|p| p.location == ParameterLocation::Query)
    {
        request.query_params()
    } else {
        HashMap::new()
    };
    let cookies = if parameters
        .iter()
        .any(|p| p.location == ParameterLocation::Cookie)
    {
        request.cookies()
    } else {
        HashMap::new()
    };

    let mut values = Map::new();
    for param in parameters {
        let Some(raw) = raw_value(param, route, request, &query, &cookies) else {
            if param.required {
                return Err(TransactionError::new(
                    ErrorCode::RequiredParameter,
                    [param.name.clone(), param.location.to_string()],
                ));
            }
            continue;
        };
        let value = coerce_value(options, &param.schema, &raw).map_err(|err| {
            debug!(
                parameter = %param.name,
                location = %param.location,
                code = %err.code(),
                "Parameter coercion failed"
            );
            err.with_status(StatusCode::BAD_REQUEST)
                .with_param(param.name.clone())
        })?;
        values.insert(param.name.clone(), value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{OperationContract, ParameterSchema, SchemaType};
    use http::{HeaderValue, Method};
    use serde_json::json;
    use std::sync::Arc;

    fn route() -> RouteMatch {
        let op = OperationContract::new("getPet", Method::GET, "/pets/{id}")
            .with_parameter("id", ParameterLocation::Path, true, ParameterSchema::of(SchemaType::Integer))
            .with_parameter("tags", ParameterLocation::Query, false, ParameterSchema::array_of(SchemaType::String))
            .with_parameter("x-debug", ParameterLocation::Header, false, ParameterSchema::of(SchemaType::Boolean))
            .with_parameter("session", ParameterLocation::Cookie, false, ParameterSchema::of(SchemaType::String));
        RouteMatch::new(Arc::new(op)).with_path_param("id", "42")
    }

    #[test]
    fn test_binds_all_locations() {
        let request = TransactionRequest::new(Method::GET, "/pets/42?tags=a,b")
            .with_header("x-debug", HeaderValue::from_static("true"))
            .with_header("cookie", HeaderValue::from_static("session=abc; other=1"));
        let values = bind_parameters(&route(), &request, &CoercionOptions::default()).unwrap();
        assert_eq!(values["id"], json!(42));
        assert_eq!(values["tags"], json!(["a", "b"]));
        assert_eq!(values["x-debug"], json!(true));
        assert_eq!(values["session"], json!("abc"));
    }

    #[test]
    fn test_optional_parameters_are_skipped() {
        let request = TransactionRequest::new(Method::GET, "/pets/42");
        let values = bind_parameters(&route(), &request, &CoercionOptions::default()).unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_missing_required_parameter() {
        let op = route().operation;
        let request = TransactionRequest::new(Method::GET, "/pets/");
        let err = bind_parameters(&RouteMatch::new(op), &request, &CoercionOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RequiredParameter);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.params(), ["id", "path"]);
    }

    #[test]
    fn test_non_reentrant_number_surfaces_as_bad_request() {
        let op = route().operation;
        let request = TransactionRequest::new(Method::GET, "/pets/042");
        let err = bind_parameters(
            &RouteMatch::new(op).with_path_param("id", "042"),
            &request,
            &CoercionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NonReentrantNumber);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.params(), ["042", "42", "id"]);
    }

    #[test]
    fn test_bad_boolean_header() {
        let request = TransactionRequest::new(Method::GET, "/pets/42")
            .with_header("x-debug", HeaderValue::from_static("1"));
        let err = bind_parameters(&route(), &request, &CoercionOptions::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadBoolean);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
