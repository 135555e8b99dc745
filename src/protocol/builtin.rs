//! Built-in functions seeded by [`Protocol::initialize`](super::Protocol::initialize).

use chrono::{Local, SecondsFormat};
use serde::Deserialize;
use serde_json::{json, Number, Value};

use super::{FunctionDescriptor, ParamSchema};
use crate::error::BoxError;

/// Message returned by `echo` when none is supplied.
pub const DEFAULT_ECHO_MESSAGE: &str = "Hello from MCP!";

#[derive(Deserialize)]
struct EchoParams {
    #[serde(default = "default_echo_message")]
    message: Value,
}

fn default_echo_message() -> Value {
    Value::String(DEFAULT_ECHO_MESSAGE.to_string())
}

#[derive(Deserialize)]
struct AddParams {
    #[serde(default = "zero")]
    a: Value,
    #[serde(default = "zero")]
    b: Value,
}

fn zero() -> Value {
    json!(0)
}

/// Add two JSON numbers, staying integral when both operands are.
fn add_numbers(a: &Value, b: &Value) -> Result<Value, BoxError> {
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        return Err(format!("operands must be numbers, got {a} and {b}").into());
    };

    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Value::Number(sum.into()));
        }
    }

    let sum = x.as_f64().unwrap_or_default() + y.as_f64().unwrap_or_default();
    Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(|| format!("sum of {x} and {y} is not a finite number").into())
}

fn echo() -> FunctionDescriptor {
    FunctionDescriptor::new("echo", "Echo back a message")
        .param("message", ParamSchema::string("Message to echo"))
        .typed_handler(|p: EchoParams| async move { Ok(json!({ "echo": p.message })) })
}

fn math_add() -> FunctionDescriptor {
    FunctionDescriptor::new("math_add", "Add two numbers")
        .param("a", ParamSchema::number("First number"))
        .param("b", ParamSchema::number("Second number"))
        .typed_handler(|p: AddParams| async move {
            add_numbers(&p.a, &p.b).map(|sum| json!({ "result": sum }))
        })
}

fn get_time() -> FunctionDescriptor {
    FunctionDescriptor::new("get_time", "Get current time").handler(|_| async move {
        let now = Local::now().to_rfc3339_opts(SecondsFormat::Micros, false);
        Ok(json!({ "current_time": now }))
    })
}

/// Descriptors registered on every `initialize`.
pub fn builtin_functions() -> Vec<FunctionDescriptor> {
    vec![echo(), math_add(), get_time()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FunctionKind;

    async fn invoke(desc: FunctionDescriptor, params: Value) -> Result<Value, BoxError> {
        match desc.kind() {
            FunctionKind::Inline(handler) => handler.call(params).await,
            FunctionKind::Default => panic!("built-ins always carry a handler"),
        }
    }

    #[tokio::test]
    async fn test_echo() {
        assert_eq!(
            invoke(echo(), json!({"message": "hi"})).await.unwrap(),
            json!({"echo": "hi"})
        );
        assert_eq!(
            invoke(echo(), json!({})).await.unwrap(),
            json!({"echo": "Hello from MCP!"})
        );
    }

    #[tokio::test]
    async fn test_math_add() {
        assert_eq!(
            invoke(math_add(), json!({"a": 10, "b": 15})).await.unwrap(),
            json!({"result": 25})
        );
        assert_eq!(
            invoke(math_add(), json!({"a": 1.5, "b": 2})).await.unwrap(),
            json!({"result": 3.5})
        );
        assert_eq!(
            invoke(math_add(), json!({"a": -4})).await.unwrap(),
            json!({"result": -4})
        );
        assert_eq!(invoke(math_add(), json!({})).await.unwrap(), json!({"result": 0}));
    }

    #[tokio::test]
    async fn test_math_add_overflow_falls_back_to_float() {
        let out = invoke(math_add(), json!({"a": i64::MAX, "b": 1})).await.unwrap();
        assert!(out["result"].is_f64());
    }

    #[tokio::test]
    async fn test_math_add_rejects_strings() {
        let err = invoke(math_add(), json!({"a": "1", "b": 2})).await.unwrap_err();
        assert!(err.to_string().contains("operands must be numbers"));
    }

    #[tokio::test]
    async fn test_get_time_is_rfc3339() {
        let out = invoke(get_time(), json!({})).await.unwrap();
        let stamp = out["current_time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_builtin_metadata() {
        let names: Vec<String> = builtin_functions().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["echo", "math_add", "get_time"]);

        let add = math_add();
        assert_eq!(add.params().get("a").unwrap().kind, "number");
        assert!(get_time().params().is_empty());
    }
}
