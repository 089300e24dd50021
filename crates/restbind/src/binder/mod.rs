//! Resource binder
//!
//! Registers create/read/update/delete routes and dispatches requests to them:
//! - pattern: `:name` path patterns
//! - request: buffered request view handed to handlers
//! - handlers: the create and resource lifecycles
//!
//! Routes are tried in registration order. A handler that returns
//! [`RouteResult::Deferred`] passes the request on to the next matching route;
//! when none is left the request ends in an empty `404 Not Found`. GET routes
//! also answer HEAD, with the response body dropped.

mod handlers;
mod pattern;
mod request;

pub use handlers::{delete_success, Locator, ResourceVerb, RouteHandler, RouteResult, ID_FIELD};
pub use pattern::{PathParams, PathPattern};
pub use request::BoundRequest;

use crate::error::{BindError, Result};
use crate::model::Resource;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use handlers::{CreateRoute, ResourceBinding, ResourceRoute};
use std::sync::Arc;
use tracing::debug;

/// Default cap on buffered request bodies (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// One registered (verb, pattern, handler) triple.
struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn RouteHandler>,
}

impl Route {
    /// GET routes also answer HEAD.
    fn accepts(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.accepts(method) && self.pattern.captures(path).is_some()
    }
}

/// Collects route registrations and turns them into an axum router.
pub struct Binder {
    routes: Vec<Route>,
    body_limit: usize,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Largest request body the dispatcher will buffer.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Register a POST route at `path` creating objects with `factory`.
    ///
    /// The response always carries the object's mapping form.
    pub fn register_create<T, F>(&mut self, path: &str, factory: F) -> Result<&mut Self>
    where
        T: Resource,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let pattern = PathPattern::parse(path)?;
        self.push(Method::POST, pattern, Arc::new(CreateRoute::new(factory)));
        Ok(self)
    }

    /// Register GET, PUT and DELETE routes at `path`, which must contain
    /// exactly one placeholder; its value is handed to `locator`.
    pub fn register_resource<L>(&mut self, path: &str, locator: L) -> Result<&mut Self>
    where
        L: Locator + 'static,
    {
        let pattern = PathPattern::parse(path)?;
        let [placeholder] = pattern.placeholders() else {
            return Err(BindError::InvalidPattern {
                pattern: path.to_string(),
                reason: "resource paths need exactly one placeholder".to_string(),
            });
        };

        let binding = Arc::new(ResourceBinding::new(placeholder.clone(), locator));
        for (method, verb) in [
            (Method::GET, ResourceVerb::Read),
            (Method::PUT, ResourceVerb::Update),
            (Method::DELETE, ResourceVerb::Delete),
        ] {
            let route = ResourceRoute::new(Arc::clone(&binding), verb);
            self.push(method, pattern.clone(), Arc::new(route));
        }
        Ok(self)
    }

    /// Register a custom handler, e.g. to take over requests other routes
    /// defer on.
    pub fn register_handler(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<&mut Self> {
        let pattern = PathPattern::parse(path)?;
        self.push(method, pattern, handler);
        Ok(self)
    }

    fn push(&mut self, method: Method, pattern: PathPattern, handler: Arc<dyn RouteHandler>) {
        debug!("Registered {} {}", method, pattern.as_str());
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
    }

    /// Registered routes as (verb, pattern) pairs, in dispatch order.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|route| (route.method.clone(), route.pattern.as_str().to_string()))
            .collect()
    }

    /// Freeze the registrations into a router.
    ///
    /// The route table is mounted as the fallback, so explicit axum routes
    /// merged alongside it take precedence.
    pub fn into_router(self) -> Router {
        let table = Arc::new(RouteTable {
            routes: self.routes,
            body_limit: self.body_limit,
        });
        Router::new().fallback(dispatch).with_state(table)
    }
}

/// Immutable route table shared by all requests.
struct RouteTable {
    routes: Vec<Route>,
    body_limit: usize,
}

impl RouteTable {
    async fn dispatch(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();
        if !self
            .routes
            .iter()
            .any(|route| route.matches(&parts.method, parts.uri.path()))
        {
            debug!("No route for {} {}", parts.method, parts.uri.path());
            return Ok(StatusCode::NOT_FOUND.into_response());
        }

        // Only buffered once some route could take the request
        let body = to_bytes(body, self.body_limit)
            .await
            .map_err(|e| BindError::Body(e.to_string()))?;
        let request = BoundRequest::new(parts, body);

        for route in &self.routes {
            if !route.accepts(request.method()) {
                continue;
            }
            let Some(params) = route.pattern.captures(request.path()) else {
                continue;
            };

            match route.handler.handle(&request, params).await? {
                RouteResult::Handled(response) => {
                    let mut response = response.into_response();
                    if *request.method() == Method::HEAD {
                        *response.body_mut() = Body::empty();
                    }
                    return Ok(response);
                }
                RouteResult::Deferred => {
                    debug!(
                        "{} {} deferred by {}",
                        request.method(),
                        request.path(),
                        route.pattern.as_str()
                    );
                }
            }
        }

        debug!("No route handled {} {}", request.method(), request.path());
        Ok(StatusCode::NOT_FOUND.into_response())
    }
}

async fn dispatch(State(table): State<Arc<RouteTable>>, request: Request) -> Response {
    match table.dispatch(request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
