//! Client object graph
//!
//! An opaque client is modelled as a tree (or graph) of [`Node`]s. Each
//! node is exactly one of: something that can be called, a container of
//! named members, or a plain value. A member that is both callable and
//! has sub-members is represented as [`Node::Callable`]; direct call
//! semantics take precedence.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tollgate_common::MeterError;

/// Error raised by a client method, passed through untouched
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Result of invoking a client method
pub type CallResult = std::result::Result<Value, ClientError>;

/// A terminal client method
#[async_trait]
pub trait Callable: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> CallResult;
}

/// A client object or sub-object with named members
pub trait Container: Send + Sync {
    /// Resolve a member by name
    fn get(&self, name: &str) -> Option<Node>;

    /// Stable identity of the underlying object, used to detect cycles
    fn identity(&self) -> usize;
}

/// One member of a client object graph
#[derive(Clone)]
pub enum Node {
    Callable(Arc<dyn Callable>),
    Container(Arc<dyn Container>),
    Value(Value),
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Callable(_) => f.write_str("Node::Callable"),
            Node::Container(c) => write!(f, "Node::Container({:#x})", c.identity()),
            Node::Value(v) => write!(f, "Node::Value({})", v),
        }
    }
}

impl Node {
    pub fn callable<C: Callable + 'static>(callable: C) -> Self {
        Node::Callable(Arc::new(callable))
    }

    pub fn container<C: Container + 'static>(container: C) -> Self {
        Node::Container(Arc::new(container))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Node::Callable(_))
    }

    pub fn as_container(&self) -> Option<&Arc<dyn Container>> {
        match self {
            Node::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Member access; only containers have members
    pub fn get(&self, name: &str) -> Option<Node> {
        self.as_container()?.get(name)
    }

    /// Resolve a dotted path such as `chat.completions.create`
    pub fn resolve(&self, path: &str) -> Option<Node> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.clone(), |node, segment| node.get(segment))
    }

    /// Invoke this node; non-callable nodes fail with a provider error
    pub async fn call(&self, args: Vec<Value>) -> CallResult {
        match self {
            Node::Callable(c) => c.call(args).await,
            other => Err(MeterError::Provider(format!("{:?} is not callable", other)).into()),
        }
    }
}

/// Adapts an async closure into a [`Callable`]
pub struct FnCallable<F> {
    f: F,
}

impl<F> FnCallable<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Callable for FnCallable<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = CallResult> + Send,
{
    async fn call(&self, args: Vec<Value>) -> CallResult {
        (self.f)(args).await
    }
}

/// Map-backed container for assembling client graphs by composition
#[derive(Default)]
pub struct ObjectNode {
    members: HashMap<String, Node>,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any member; a later member with the same name replaces the earlier one
    pub fn with(mut self, name: impl Into<String>, node: Node) -> Self {
        self.members.insert(name.into(), node);
        self
    }

    pub fn with_method<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult> + Send + 'static,
    {
        self.with(name, Node::callable(FnCallable::new(f)))
    }

    pub fn with_object(self, name: impl Into<String>, object: ObjectNode) -> Self {
        self.with(name, object.into_node())
    }

    pub fn with_value(self, name: impl Into<String>, value: Value) -> Self {
        self.with(name, Node::Value(value))
    }

    pub fn into_node(self) -> Node {
        Node::container(self)
    }
}

impl Container for ObjectNode {
    fn get(&self, name: &str) -> Option<Node> {
        self.members.get(name).cloned()
    }

    fn identity(&self) -> usize {
        self as *const Self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Node {
        ObjectNode::new()
            .with_value("api_version", json!("2024-06-01"))
            .with_object(
                "chat",
                ObjectNode::new().with_object(
                    "completions",
                    ObjectNode::new().with_method("create", |args| async move {
                        Ok(json!({ "echo": args }))
                    }),
                ),
            )
            .into_node()
    }

    #[tokio::test]
    async fn test_resolve_and_call() {
        let client = client();
        let create = client.resolve("chat.completions.create").unwrap();
        assert!(create.is_callable());

        let result = create.call(vec![json!({"model": "m"})]).await.unwrap();
        assert_eq!(result, json!({"echo": [{"model": "m"}]}));
    }

    #[tokio::test]
    async fn test_non_callable_call_fails() {
        let client = client();
        let err = client.resolve("chat").unwrap().call(vec![]).await.unwrap_err();
        assert!(err.downcast_ref::<MeterError>().is_some());
    }

    #[test]
    fn test_missing_member() {
        let client = client();
        assert!(client.resolve("chat.missing.create").is_none());
        assert_eq!(
            client.get("api_version").unwrap().as_value(),
            Some(&json!("2024-06-01"))
        );
        // Values have no members
        assert!(client.resolve("api_version.inner").is_none());
    }
}
