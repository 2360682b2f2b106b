use http::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// Primitive types a parameter schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// The subset of a parameter's JSON schema the coercion library needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default)]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,
}

impl ParameterSchema {
    #[must_use]
    pub fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            items: None,
        }
    }

    #[must_use]
    pub fn array_of(items: SchemaType) -> Self {
        Self {
            schema_type: SchemaType::Array,
            items: Some(Box::new(Self::of(items))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMeta {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: ParameterSchema,
}

/// Capabilities declared by a matched API operation.
///
/// Supplied by the routing collaborator and only read by the transaction core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContract {
    pub operation_id: String,
    #[serde(with = "method_serde")]
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub consumable_media_types: Vec<String>,
    #[serde(default)]
    pub consumable_charsets: Vec<String>,
    #[serde(default)]
    pub producible_media_types: Vec<String>,
    #[serde(default)]
    pub producible_charsets: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterMeta>,
}

impl OperationContract {
    #[must_use]
    pub fn new(operation_id: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            method,
            path: path.into(),
            consumable_media_types: Vec::new(),
            consumable_charsets: Vec::new(),
            producible_media_types: Vec::new(),
            producible_charsets: Vec::new(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn consumes<I, S>(mut self, media_types: I, charsets: &[&str]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumable_media_types = media_types.into_iter().map(Into::into).collect();
        self.consumable_charsets = charsets.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn produces<I, S>(mut self, media_types: I, charsets: &[&str]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.producible_media_types = media_types.into_iter().map(Into::into).collect();
        self.producible_charsets = charsets.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        location: ParameterLocation,
        required: bool,
        schema: ParameterSchema,
    ) -> Self {
        self.parameters.push(ParameterMeta {
            name: name.into(),
            location,
            required,
            schema,
        });
        self
    }
}

/// Result of route matching handed over by the routing collaborator.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub operation: Arc<OperationContract>,
    /// Raw path parameter values, in declaration order
    pub path_params: Vec<(String, String)>,
}

impl RouteMatch {
    #[must_use]
    pub fn new(operation: Arc<OperationContract>) -> Self {
        Self {
            operation,
            path_params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a name repeats at different path depths.
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

mod method_serde {
    use http::Method;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
        let s = String::deserialize(deserializer)?;
        Method::from_bytes(s.to_ascii_uppercase().as_bytes())
            .map_err(|_| serde::de::Error::custom(format!("invalid HTTP method: {s}")))
    }
}
