//! Closure adapters implementing [`Handler`].

use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{BoxFuture, Handler, HandlerResult};
use crate::error::BoxError;

/// Handler over the raw parameter payload.
pub struct FnHandler<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    /// Create a new raw handler.
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, params: Value) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(params))
    }
}

/// Wrapper that deserializes parameters before calling the handler and
/// serializes whatever it returns.
pub struct TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> (R, Fut)>,
}

impl<F, T, R, Fut> TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, R, Fut> Handler for TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
{
    fn call(&self, params: Value) -> BoxFuture<'static, HandlerResult> {
        let parsed: T = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e.into()) }),
        };

        let fut = (self.handler)(parsed);
        Box::pin(async move {
            let out = fut.await?;
            let value = serde_json::to_value(out)?;
            Ok::<_, BoxError>(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Pair {
        a: i64,
        b: i64,
    }

    #[tokio::test]
    async fn test_fn_handler_passes_params_unchanged() {
        let handler = FnHandler::new(|params| async move { Ok(params) });

        let params = json!({"nested": {"x": [1, 2, 3]}});
        let out = handler.call(params.clone()).await.unwrap();
        assert_eq!(out, params);
    }

    #[tokio::test]
    async fn test_typed_handler_roundtrip() {
        let handler = TypedHandler::new(|p: Pair| async move { Ok(json!({"sum": p.a + p.b})) });

        let out = handler.call(json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(out, json!({"sum": 5}));
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_bad_params() {
        let handler = TypedHandler::new(|p: Pair| async move { Ok(p.a) });

        let err = handler.call(json!({"a": "two"})).await.unwrap_err();
        assert!(err.is::<serde_json::Error>());
    }

    #[tokio::test]
    async fn test_handler_error_is_preserved() {
        #[derive(Debug)]
        struct Boom;
        impl std::fmt::Display for Boom {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("boom")
            }
        }
        impl std::error::Error for Boom {}

        let handler = FnHandler::new(|_| async move { Err(Box::new(Boom) as BoxError) });

        let err = handler.call(Value::Null).await.unwrap_err();
        assert!(err.downcast_ref::<Boom>().is_some());
    }
}
