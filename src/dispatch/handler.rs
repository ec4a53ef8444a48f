//! The callable contract shared by hooks and route handlers.

use crate::dispatch::context::RequestContext;

pub use futures_util::future::BoxFuture;

/// A pipeline step that receives full control of the request context.
///
/// A before hook hands control on with [`RequestContext::next`]; any step
/// may end the lifecycle with [`RequestContext::send`] or
/// [`RequestContext::error`]. Returning without doing either leaves the
/// request unresolved.
///
/// Closures of the shape `|rest| Box::pin(async move { ... })` implement
/// this trait.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, rest: &'a mut RequestContext) -> BoxFuture<'a, ()>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, rest: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        self(rest)
    }
}
