//! Function descriptors and their public metadata.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::BoxError;
use crate::handler::{FnHandler, Handler, HandlerResult, TypedHandler};

/// Schema fragment describing one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSchema {
    /// Type tag, e.g. `"string"` or `"number"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// Value used when the caller omits the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSchema {
    /// Create a schema fragment with an arbitrary type tag.
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            default: None,
        }
    }

    /// A `"string"` parameter.
    pub fn string(description: impl Into<String>) -> Self {
        Self::new("string", description)
    }

    /// A `"number"` parameter.
    pub fn number(description: impl Into<String>) -> Self {
        Self::new("number", description)
    }

    /// Attach a default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered mapping from parameter name to schema fragment.
///
/// Serializes as a JSON object in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Vec<(String, ParamSchema)>);

impl Parameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter, keeping its original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, schema: ParamSchema) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.0.push((name, schema)),
        }
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParamSchema> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamSchema)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

/// How a descriptor is executed.
#[derive(Clone)]
pub enum FunctionKind {
    /// Run the descriptor's own handler.
    Inline(Arc<dyn Handler>),
    /// Fall through to the protocol's default executor.
    Default,
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Inline(_) => f.write_str("Inline(..)"),
            FunctionKind::Default => f.write_str("Default"),
        }
    }
}

/// A named, schema-described function.
///
/// Built once and treated as immutable after registration.
///
/// # Example
///
/// ```
/// use streamcall::protocol::{FunctionDescriptor, ParamSchema};
///
/// let desc = FunctionDescriptor::new("shout", "Upper-case a message")
///     .param("message", ParamSchema::string("Message to shout"))
///     .handler(|params| async move {
///         let msg = params["message"].as_str().unwrap_or_default().to_uppercase();
///         Ok(serde_json::json!({ "shout": msg }))
///     });
///
/// assert!(desc.has_handler());
/// ```
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    name: String,
    description: String,
    parameters: Parameters,
    kind: FunctionKind,
}

impl FunctionDescriptor {
    /// Create a descriptor without a handler (executed by the default executor).
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Parameters::new(),
            kind: FunctionKind::Default,
        }
    }

    /// Declare a parameter.
    pub fn param(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        self.parameters.insert(name, schema);
        self
    }

    /// Replace the whole parameter set.
    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Attach a handler over the raw parameter payload.
    pub fn handler<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.with_handler(FnHandler::new(handler))
    }

    /// Attach a handler that receives deserialized parameters.
    pub fn typed_handler<F, T, R, Fut>(self, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    {
        self.with_handler(TypedHandler::new(handler))
    }

    /// Attach any [`Handler`] implementation.
    pub fn with_handler(mut self, handler: impl Handler) -> Self {
        self.kind = FunctionKind::Inline(Arc::new(handler));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn params(&self) -> &Parameters {
        &self.parameters
    }

    #[inline]
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn has_handler(&self) -> bool {
        matches!(self.kind, FunctionKind::Inline(_))
    }

    /// Public metadata, without the handler.
    pub fn info(&self) -> FunctionInfo {
        FunctionInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// Entry returned by `list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub description: String,
    pub parameters: Parameters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameters_keep_declaration_order() {
        let desc = FunctionDescriptor::new("f", "d")
            .param("zeta", ParamSchema::number("last letter"))
            .param("alpha", ParamSchema::number("first letter"));

        let names: Vec<&str> = desc.params().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_parameters_replace_in_place() {
        let mut params = Parameters::new();
        params.insert("a", ParamSchema::number("one"));
        params.insert("b", ParamSchema::number("two"));
        params.insert("a", ParamSchema::string("again"));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a").unwrap().kind, "string");
        assert_eq!(params.iter().next().unwrap().0, "a");
    }

    #[test]
    fn test_info_serialization() {
        let desc = FunctionDescriptor::new("count", "Count things").param(
            "count_to",
            ParamSchema::number("Count up to this number").with_default(10),
        );

        let value = serde_json::to_value(desc.info()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "count",
                "description": "Count things",
                "parameters": {
                    "count_to": {
                        "type": "number",
                        "description": "Count up to this number",
                        "default": 10
                    }
                }
            })
        );
    }

    #[test]
    fn test_default_kind_without_handler() {
        let desc = FunctionDescriptor::new("f", "d");
        assert!(!desc.has_handler());
        assert!(matches!(desc.kind(), FunctionKind::Default));

        let desc = desc.handler(|p| async move { Ok(p) });
        assert!(desc.has_handler());
    }
}
