//! Routes and the process-wide sentinel routes.

use axum::http::{Method, StatusCode};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, Weak};

use crate::routing::error::RouterError;
use crate::routing::matcher::{parse_segments, RouteMatch, RoutePattern, Segment};
use crate::routing::middleware::{handler_fn, Handler, MiddlewareHolder};
use crate::routing::router::{Router, RouterNode};

static NOT_FOUND_ROUTE: Lazy<Arc<Route>> = Lazy::new(|| {
    Arc::new(Route::detached(handler_fn(|response, _| {
        response.status(StatusCode::NOT_FOUND)
    })))
});

static METHOD_NOT_ALLOWED_ROUTE: Lazy<Arc<Route>> = Lazy::new(|| {
    Arc::new(Route::detached(handler_fn(|response, _| {
        response.status(StatusCode::METHOD_NOT_ALLOWED)
    })))
});

/// Route stored in a [`RouteMatch`] when nothing matched the path.
pub fn not_found_route() -> Arc<Route> {
    Arc::clone(&NOT_FOUND_ROUTE)
}

/// Route stored in a [`RouteMatch`] when the path matched but the method did not.
pub fn method_not_allowed_route() -> Arc<Route> {
    Arc::clone(&METHOD_NOT_ALLOWED_ROUTE)
}

/// A binding of methods and a URI pattern to a handler.
///
/// Routes are created by [`Router::route`] and owned by their router. Equality is identity.
pub struct Route {
    name: OnceLock<String>,
    uri: String,
    methods: Vec<Method>,
    pattern: Option<RoutePattern>,
    handler: Handler,
    middleware: MiddlewareHolder,
    parent: Weak<RouterNode>,
}

impl Route {
    pub(crate) fn new(
        uri: String,
        methods: Vec<Method>,
        pattern: RoutePattern,
        handler: Handler,
        middleware: MiddlewareHolder,
        parent: Weak<RouterNode>,
    ) -> Self {
        Self {
            name: OnceLock::new(),
            uri,
            methods,
            pattern: Some(pattern),
            handler,
            middleware,
            parent,
        }
    }

    /// A route outside any router. It never matches a request.
    pub(crate) fn detached(handler: Handler) -> Self {
        Self {
            name: OnceLock::new(),
            uri: String::new(),
            methods: Vec::new(),
            pattern: None,
            handler,
            middleware: MiddlewareHolder::new(),
            parent: Weak::new(),
        }
    }

    /// Register the route under `name` in the tree-wide named-route index.
    pub fn name(self: &Arc<Self>, name: impl Into<String>) -> Result<Arc<Self>, RouterError> {
        let name = name.into();
        let parent = self
            .parent
            .upgrade()
            .ok_or_else(|| RouterError::DetachedRoute(self.uri.clone()))?;

        let mut named = parent
            .named_routes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if named.contains_key(&name) {
            return Err(RouterError::DuplicateRouteName(name));
        }
        if let Some(existing) = self.name.get() {
            return Err(RouterError::AlreadyNamed(existing.clone()));
        }
        self.name
            .set(name.clone())
            .map_err(RouterError::AlreadyNamed)?;
        named.insert(name, Arc::clone(self));
        Ok(Arc::clone(self))
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// URI pattern relative to the parent router.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn middleware(&self) -> &MiddlewareHolder {
        &self.middleware
    }

    pub fn parent(&self) -> Option<Router> {
        self.parent.upgrade().map(Router::from_node)
    }

    /// URI pattern including the prefixes of every ancestor router.
    pub fn full_uri(&self) -> String {
        let mut prefixes = Vec::new();
        let mut node = self.parent.upgrade();
        while let Some(current) = node {
            prefixes.push(current.prefix.clone());
            node = current.parent.upgrade();
        }
        prefixes.reverse();

        let mut uri = prefixes.concat();
        uri.push_str(&self.uri);
        uri
    }

    /// Build a concrete URI, substituting `params` for the placeholders in order.
    pub fn build_uri(&self, params: &[&str]) -> Result<String, RouterError> {
        let full = self.full_uri();
        let segments = parse_segments(&full)?;
        let expected = segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param { .. }))
            .count();
        if expected != params.len() {
            return Err(RouterError::ParameterCount {
                uri: full,
                expected,
                actual: params.len(),
            });
        }

        let mut values = params.iter();
        let mut uri = String::with_capacity(full.len());
        for segment in &segments {
            match segment {
                Segment::Literal(text) => uri.push_str(text),
                Segment::Param { .. } => {
                    if let Some(value) = values.next() {
                        uri.push_str(value);
                    }
                }
            }
        }
        Ok(uri)
    }

    /// Test the route against the path left in `route_match` and the request method.
    ///
    /// On a full match the route and its parameters are stored and `true` is returned. A path
    /// match with another method stores the method-not-allowed sentinel and returns `false`.
    pub fn match_request<B>(
        self: &Arc<Self>,
        request: &axum::http::Request<B>,
        route_match: &mut RouteMatch,
    ) -> bool {
        self.match_method(request.method(), route_match)
    }

    pub(crate) fn match_method(self: &Arc<Self>, method: &Method, route_match: &mut RouteMatch) -> bool {
        let Some(pattern) = &self.pattern else {
            return false;
        };
        let Some((_, params)) = pattern.captures(&route_match.current_path) else {
            return false;
        };

        if self.methods.contains(method) {
            route_match.route = Arc::clone(self);
            route_match.merge_params(params);
            true
        } else {
            route_match.route = method_not_allowed_route();
            false
        }
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Route {}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name.get())
            .field("uri", &self.uri)
            .field("methods", &self.methods)
            .field("middleware", &self.middleware)
            .finish()
    }
}
