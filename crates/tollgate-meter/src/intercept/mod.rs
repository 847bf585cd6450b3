//! Interception module
//!
//! Transparent, recursive call interception over client objects of
//! unknown shape:
//! - Node: Capability model (callable, container, value)
//! - Wrapper: Lazily wrapped surrogates that track successful calls

pub mod node;
pub mod wrapper;

pub use node::{CallResult, Callable, ClientError, Container, FnCallable, Node, ObjectNode};
pub use wrapper::{
    wrap, TrackedCallable, TrackedContainer, TrackingContext, TrackingErrorHook, UsageTracker,
};
