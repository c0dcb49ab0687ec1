//! HTTP request handlers and routing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::{Method, Request};
use crate::server::connection::ConnectionContext;
use crate::server::{Error, Response, StatusCode};

/// Type alias for a boxed future that returns a Result<Response, Error>.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>;

/// The dispatch hook a connection calls once per parsed request.
pub type HandlerFn = Arc<dyn Fn(Request, ConnectionContext) -> HandlerFuture + Send + Sync>;

/// Wrap an async function or closure as a [`HandlerFn`].
pub fn handler_fn<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(Request, ConnectionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    Arc::new(move |req: Request, ctx: ConnectionContext| -> HandlerFuture { Box::pin(handler(req, ctx)) })
}

/// Represents a route in the HTTP server.
pub struct Route {
    /// The path to match, without query string.
    pub path: String,
    /// The HTTP methods to match.
    pub methods: Vec<Method>,
    /// The handler function.
    pub handler: HandlerFn,
}

/// Dispatches requests to routes by exact path and method.
///
/// Requests for paths without a route go to the fallback, if one is set and
/// accepts the method.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    fallback: Option<Route>,
}

impl Router {
    /// Create a router with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route.
    pub fn route<F, Fut>(mut self, path: impl Into<String>, methods: Vec<Method>, handler: F) -> Self
    where
        F: Fn(Request, ConnectionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        self.routes.push(Route {
            path: path.into(),
            methods,
            handler: handler_fn(handler),
        });
        self
    }

    /// Set the handler for paths that match no route.
    pub fn fallback<F, Fut>(mut self, methods: Vec<Method>, handler: F) -> Self
    where
        F: Fn(Request, ConnectionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        self.fallback = Some(Route {
            path: String::new(),
            methods,
            handler: handler_fn(handler),
        });
        self
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route one request.
    pub fn dispatch(&self, request: Request, context: ConnectionContext) -> HandlerFuture {
        let path = request.route_path();
        let mut candidates = self.routes.iter().filter(|route| route.path == path).peekable();

        if candidates.peek().is_none() {
            return match &self.fallback {
                Some(fallback) if fallback.methods.contains(&request.method) => {
                    (fallback.handler)(request, context)
                }
                Some(fallback) => ready(method_not_allowed(&request, &fallback.methods)),
                None => ready(Response::text(
                    StatusCode::NotFound,
                    format!("Not found: {}", request.path),
                )),
            };
        }

        let allowed: Vec<Method> = candidates.flat_map(|route| route.methods.iter().cloned()).collect();
        match self
            .routes
            .iter()
            .find(|route| route.path == request.route_path() && route.methods.contains(&request.method))
        {
            Some(route) => (route.handler)(request, context),
            None => ready(method_not_allowed(&request, &allowed)),
        }
    }

    /// Turn the router into the dispatch hook for connections.
    pub fn into_handler(self) -> HandlerFn {
        let router = Arc::new(self);
        Arc::new(move |req: Request, ctx: ConnectionContext| router.dispatch(req, ctx))
    }
}

fn ready(response: Response) -> HandlerFuture {
    Box::pin(std::future::ready(Ok(response)))
}

fn method_not_allowed(request: &Request, allowed: &[Method]) -> Response {
    let allowed = allowed.iter().map(Method::to_string).collect::<Vec<String>>().join(", ");

    let message = match &request.method {
        Method::GET => format!(
            "Method GET not allowed for path: {path}. Allowed methods: {allowed}",
            path = request.route_path()
        ),
        Method::POST | Method::PUT => "PUT and POST methods not yet supported".to_string(),
        method => format!("Unrecognized method: {method}"),
    };

    Response::text(StatusCode::MethodNotAllowed, message).with_header("Allow", allowed)
}
