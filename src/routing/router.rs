//! Router tree: registration, matching and dispatch.
//!
//! # Responsibilities
//! - Register routes, subrouters, middleware, status handlers and CORS options
//! - Match a request against the tree (prefix, then subrouters, then routes)
//! - Compose the middleware chain from the root down to the matched route and run it
//! - Finalize the response through the status handlers
//!
//! # Design Decisions
//! - [`Router`] is a handle over a shared node; cloning it is cheap
//! - Children own nothing upwards: parents are `Weak` links, and every handle keeps the root
//!   (and so the whole tree) alive
//! - Middleware is inherited by composition at dispatch time, never copied into children
//! - Status handlers are copied into a subrouter when it is created
//! - Registration happens before serving; no lock is held while a handler runs

use axum::http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::config::ConfigHandle;
use crate::http::protocol::protocol_redirect;
use crate::http::{RawRequest, Request, Response, ResponseWriter};
use crate::routing::error::RouterError;
use crate::routing::matcher::{PatternKind, RouteMatch, RoutePattern};
use crate::routing::middleware::{
    handler_fn, language_middleware, panic_message, parse_request_middleware,
    recovery_middleware, Handler, Middleware, MiddlewareHolder,
};
use crate::routing::route::{not_found_route, Route};
use crate::routing::static_files::{static_handler, RESOURCE_PARAM};
use crate::routing::status::{default_status_handlers, error_status_handler};
use crate::security::cors::{cors_middleware, CorsOptions};

pub(crate) type NamedRoutes = Arc<RwLock<HashMap<String, Arc<Route>>>>;

pub(crate) struct RouterNode {
    pub(crate) prefix: String,
    prefix_pattern: Option<RoutePattern>,
    pub(crate) parent: Weak<RouterNode>,
    pub(crate) named_routes: NamedRoutes,
    config: ConfigHandle,
    state: RwLock<RouterState>,
}

struct RouterState {
    middleware: MiddlewareHolder,
    subrouters: Vec<Arc<RouterNode>>,
    routes: Vec<Arc<Route>>,
    status_handlers: HashMap<StatusCode, Handler>,
    cors_options: Option<Arc<CorsOptions>>,
    has_cors_middleware: bool,
}

impl RouterNode {
    fn state(&self) -> RwLockReadGuard<'_, RouterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, RouterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A node of the router tree.
#[derive(Clone)]
pub struct Router {
    node: Arc<RouterNode>,
    root: Arc<RouterNode>,
}

impl Router {
    /// Create a root router.
    ///
    /// It starts with the recovery, language and request-parsing middleware, and with the
    /// default status handlers for every 4xx and 5xx code.
    pub fn new(config: ConfigHandle) -> Self {
        let node = Arc::new(RouterNode {
            prefix: String::new(),
            prefix_pattern: None,
            parent: Weak::new(),
            named_routes: NamedRoutes::default(),
            config: config.clone(),
            state: RwLock::new(RouterState {
                middleware: MiddlewareHolder::new(),
                subrouters: Vec::new(),
                routes: Vec::new(),
                status_handlers: default_status_handlers(),
                cors_options: None,
                has_cors_middleware: false,
            }),
        });

        let router = Self::from_node(node);
        router
            .middleware(recovery_middleware())
            .middleware(language_middleware(config))
            .middleware(parse_request_middleware());
        router
    }

    pub(crate) fn from_node(node: Arc<RouterNode>) -> Self {
        let mut root = Arc::clone(&node);
        while let Some(parent) = root.parent.upgrade() {
            root = parent;
        }
        Self { node, root }
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.node.config
    }

    /// Prefix of this router, relative to its parent.
    pub fn prefix(&self) -> &str {
        &self.node.prefix
    }

    pub fn parent(&self) -> Option<Router> {
        self.node.parent.upgrade().map(Router::from_node)
    }

    /// Root of the tree this router belongs to.
    pub fn root(&self) -> Router {
        Router::from_node(Arc::clone(&self.root))
    }

    pub fn subrouters(&self) -> Vec<Router> {
        self.node
            .state()
            .subrouters
            .iter()
            .map(|node| Router::from_node(Arc::clone(node)))
            .collect()
    }

    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.node.state().routes.clone()
    }

    /// Number of middleware registered on this router (inherited ones excluded).
    pub fn middleware_len(&self) -> usize {
        self.node.state().middleware.len()
    }

    pub fn status_handler_count(&self) -> usize {
        self.node.state().status_handlers.len()
    }

    pub fn cors_options(&self) -> Option<Arc<CorsOptions>> {
        self.node.state().cors_options.clone()
    }

    pub fn has_cors_middleware(&self) -> bool {
        self.node.state().has_cors_middleware
    }

    /// Append a middleware. It applies to every route of this router and of its subrouters.
    pub fn middleware(&self, middleware: Middleware) -> &Self {
        self.node.state_mut().middleware.push(middleware);
        self
    }

    /// Create a child router mounted at `prefix`.
    ///
    /// A bare `/` prefix is treated as empty. Placeholders are allowed in the prefix and their
    /// values are added to the route parameters.
    pub fn subrouter(&self, prefix: &str) -> Result<Router, RouterError> {
        let prefix = normalize_uri(prefix);
        let prefix_pattern = if prefix.is_empty() {
            None
        } else {
            Some(RoutePattern::compile(&prefix, PatternKind::Prefix)?)
        };

        let mut state = self.node.state_mut();
        let node = Arc::new(RouterNode {
            prefix,
            prefix_pattern,
            parent: Arc::downgrade(&self.node),
            named_routes: Arc::clone(&self.node.named_routes),
            config: self.node.config.clone(),
            state: RwLock::new(RouterState {
                middleware: MiddlewareHolder::new(),
                subrouters: Vec::new(),
                routes: Vec::new(),
                status_handlers: state.status_handlers.clone(),
                cors_options: state.cors_options.clone(),
                has_cors_middleware: state.has_cors_middleware,
            }),
        });
        state.subrouters.push(Arc::clone(&node));
        drop(state);

        tracing::debug!(prefix = %node.prefix, parent = %self.node.prefix, "Registered subrouter");
        Ok(Router::from_node(node))
    }

    /// Create a child router without a prefix, to scope middleware or status handlers.
    pub fn group(&self) -> Result<Router, RouterError> {
        self.subrouter("")
    }

    /// Register a route for `methods` (e.g. `"GET|POST"`) on `uri`.
    pub fn route<F>(&self, methods: &str, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.register_route(methods, uri, handler_fn(handler), Vec::new())
    }

    /// Register a route with route-local middleware, run after the router middleware.
    pub fn route_with_middleware<F>(
        &self,
        methods: &str,
        uri: &str,
        handler: F,
        middleware: Vec<Middleware>,
    ) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.register_route(methods, uri, handler_fn(handler), middleware)
    }

    pub fn get<F>(&self, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.route("GET", uri, handler)
    }

    pub fn post<F>(&self, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.route("POST", uri, handler)
    }

    pub fn put<F>(&self, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.route("PUT", uri, handler)
    }

    pub fn patch<F>(&self, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.route("PATCH", uri, handler)
    }

    pub fn delete<F>(&self, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.route("DELETE", uri, handler)
    }

    pub fn options<F>(&self, uri: &str, handler: F) -> Result<Arc<Route>, RouterError>
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        self.route("OPTIONS", uri, handler)
    }

    /// Register an already boxed handler.
    ///
    /// When the router has CORS options, `OPTIONS` is added to the methods.
    pub fn register_route(
        &self,
        methods: &str,
        uri: &str,
        handler: Handler,
        middleware: Vec<Middleware>,
    ) -> Result<Arc<Route>, RouterError> {
        let uri = normalize_uri(uri);
        let mut methods = parse_methods(methods, &uri)?;
        let pattern = RoutePattern::compile(&uri, PatternKind::Full)?;

        let mut state = self.node.state_mut();
        if state.cors_options.is_some() && !methods.contains(&Method::OPTIONS) {
            methods.push(Method::OPTIONS);
        }

        let route = Arc::new(Route::new(
            uri,
            methods,
            pattern,
            handler,
            MiddlewareHolder::from(middleware),
            Arc::downgrade(&self.node),
        ));
        state.routes.push(Arc::clone(&route));

        tracing::debug!(
            methods = ?route.methods(),
            uri = %route.full_uri(),
            "Registered route"
        );
        Ok(route)
    }

    /// Serve the files of `directory` under `uri`.
    ///
    /// The rest of the path after `uri` is the requested file; see
    /// [`clean_static_path`](crate::routing::clean_static_path).
    pub fn static_files(
        &self,
        uri: &str,
        directory: impl Into<String>,
        download: bool,
    ) -> Result<Arc<Route>, RouterError> {
        let pattern = format!("{}{{{}:.*}}", uri, RESOURCE_PARAM);
        self.register_route(
            "GET|HEAD",
            &pattern,
            static_handler(directory, download),
            Vec::new(),
        )
    }

    /// Register `handler` for each of `codes`, replacing inherited handlers for those codes.
    pub fn status_handler<F>(&self, handler: F, codes: &[StatusCode]) -> &Self
    where
        F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
    {
        let handler = handler_fn(handler);
        let mut state = self.node.state_mut();
        for code in codes {
            state.status_handlers.insert(*code, Arc::clone(&handler));
        }
        self
    }

    /// Enable CORS for this router.
    ///
    /// The CORS middleware is added once; calling again only replaces the options. Routes
    /// registered afterwards also accept `OPTIONS`.
    pub fn cors(&self, options: CorsOptions) -> &Self {
        let mut state = self.node.state_mut();
        state.cors_options = Some(Arc::new(options));
        if !state.has_cors_middleware {
            state.middleware.push(cors_middleware());
            state.has_cors_middleware = true;
        }
        self
    }

    /// Route registered under `name` anywhere in the tree.
    pub fn get_route(&self, name: &str) -> Option<Arc<Route>> {
        self.node
            .named_routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Match `request` against this router and its descendants.
    ///
    /// Returns `true` with the matched route, or with the method-not-allowed sentinel when a
    /// path matched but no route accepted the method. Otherwise the not-found sentinel is
    /// stored and `false` is returned.
    pub fn match_request<B>(
        &self,
        request: &axum::http::Request<B>,
        route_match: &mut RouteMatch,
    ) -> bool {
        if match_node(&self.node, request.method(), route_match) {
            return true;
        }
        if route_match.is_method_not_allowed() {
            return true;
        }
        route_match.route = not_found_route();
        false
    }

    /// Run the matched route through the middleware chain and finalize the response.
    ///
    /// The chain is made of the middleware of every router from the root down to this one,
    /// then the route middleware, then the route handler.
    pub fn request_handler(
        &self,
        route_match: &RouteMatch,
        writer: ResponseWriter,
        raw: RawRequest,
    ) -> ResponseWriter {
        let route = Arc::clone(&route_match.route);
        let mut response = Response::new(writer);
        let mut request = Request::new(raw).with_params(route_match.parameters.clone());
        request.set_route(Arc::clone(&route));
        request.set_cors_options(self.cors_options());

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let handler = self.build_chain(&route);
            handler(&mut response, &mut request);
        }));
        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                method = %request.method(),
                path = %request.uri().path(),
                panic = %message,
                "Middleware chain panicked"
            );
            response.set_error(message);
            response.status(StatusCode::INTERNAL_SERVER_ERROR);
        }

        self.finalize(&mut response, &mut request);
        response.into_writer()
    }

    /// Entry point for the HTTP substrate.
    ///
    /// Redirects requests made with the wrong scheme, otherwise matches the request from this
    /// router and dispatches it on the router owning the matched route.
    pub fn serve_http(&self, raw: RawRequest) -> ResponseWriter {
        let config = self.node.config.load();
        if let Some(redirect) = protocol_redirect(&config, &raw) {
            return redirect;
        }

        let path = decode_path(raw.uri().path()).into_owned();
        let mut route_match = RouteMatch::new(path.as_str());
        let matched = self.match_request(&raw, &mut route_match);
        if matched {
            tracing::debug!(
                method = %raw.method(),
                path = %path,
                route = ?route_match.route.get_name(),
                "Matched route"
            );
        } else {
            tracing::debug!(method = %raw.method(), path = %path, "No route matched");
        }

        let router = route_match.route.parent().unwrap_or_else(|| self.clone());
        router.request_handler(&route_match, ResponseWriter::new(), raw)
    }

    fn build_chain(&self, route: &Route) -> Handler {
        let mut chain = route.middleware().apply(Arc::clone(route.handler()));
        let mut node = Some(Arc::clone(&self.node));
        while let Some(current) = node {
            chain = current.state().middleware.apply(chain);
            node = current.parent.upgrade();
        }
        chain
    }

    fn finalize(&self, response: &mut Response, request: &mut Request) {
        if response.is_empty() {
            match response.get_status() {
                None => response.status(StatusCode::NO_CONTENT),
                Some(status) => {
                    if let Some(handler) = self.resolve_status_handler(status) {
                        run_status_handler(status, &handler, response, request);
                    } else if status.as_u16() >= 400 {
                        run_status_handler(status, &handler_fn(error_status_handler), response, request);
                    }
                }
            }
        }
        response.flush_header();
    }

    fn resolve_status_handler(&self, status: StatusCode) -> Option<Handler> {
        let mut node = Some(Arc::clone(&self.node));
        while let Some(current) = node {
            if let Some(handler) = current.state().status_handlers.get(&status) {
                return Some(Arc::clone(handler));
            }
            node = current.parent.upgrade();
        }
        None
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(ConfigHandle::default())
    }
}

impl PartialEq for Router {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Router {}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.node.state();
        f.debug_struct("Router")
            .field("prefix", &self.node.prefix)
            .field("middleware", &state.middleware)
            .field("subrouters", &state.subrouters.len())
            .field("routes", &state.routes.len())
            .finish()
    }
}

/// Percent-decoded request path. A path that does not decode to UTF-8 is matched as sent.
fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8().unwrap_or(Cow::Borrowed(path))
}

/// Check the node prefix, then its subrouters in order, then its routes in order.
fn match_node(node: &RouterNode, method: &Method, route_match: &mut RouteMatch) -> bool {
    if let Some(pattern) = &node.prefix_pattern {
        let Some((len, params)) = pattern.captures(&route_match.current_path) else {
            return false;
        };
        let rest = &route_match.current_path[len..];
        if !(rest.is_empty() || rest.starts_with('/') || node.prefix.ends_with('/')) {
            return false;
        }
        let prefix = route_match.current_path[..len].to_string();
        route_match.trim_current_path(&prefix);
        route_match.merge_params(params);
    }

    let state = node.state();
    for child in &state.subrouters {
        let saved_path = route_match.current_path.clone();
        let saved_params = route_match.parameters.clone();
        if match_node(child, method, route_match) {
            return true;
        }
        route_match.current_path = saved_path;
        route_match.parameters = saved_params;
    }

    state
        .routes
        .iter()
        .any(|route| route.match_method(method, route_match))
}

/// Run a status handler once. A panic inside it leaves a bare 500.
fn run_status_handler(
    status: StatusCode,
    handler: &Handler,
    response: &mut Response,
    request: &mut Request,
) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| handler(response, request)));
    if let Err(payload) = result {
        let message = panic_message(payload.as_ref());
        tracing::error!(status = status.as_u16(), panic = %message, "Status handler panicked");
        response.set_error(message);
        if !response.wrote_header() {
            response.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

/// A bare `/` becomes empty so that a route or subrouter serves its parent's index.
fn normalize_uri(uri: &str) -> String {
    if uri == "/" {
        String::new()
    } else {
        uri.to_string()
    }
}

/// Split a `GET|POST` method specification, keeping its order.
fn parse_methods(list: &str, uri: &str) -> Result<Vec<Method>, RouterError> {
    let mut methods: Vec<Method> = Vec::new();
    for token in list.split('|').map(str::trim).filter(|token| !token.is_empty()) {
        let method = Method::from_bytes(token.to_ascii_uppercase().as_bytes())
            .map_err(|_| RouterError::InvalidMethod(token.to_string()))?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    if methods.is_empty() {
        return Err(RouterError::NoMethods(uri.to_string()));
    }
    Ok(methods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn raw(method: &str, uri: &str) -> RawRequest {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn noop(_: &mut Response, _: &mut Request) {}

    #[test]
    fn test_new_router_has_builtin_middleware() {
        let router = Router::default();
        assert_eq!(router.middleware_len(), 3);
        assert_eq!(router.status_handler_count(), 200);
        assert!(router.parent().is_none());
    }

    #[test]
    fn test_register_route() {
        let router = Router::default();
        let route = router.route("GET", "/uri", noop).unwrap();
        assert!(router.routes().contains(&route));
        assert_eq!(route.parent(), Some(router.clone()));

        let route = router.route("GET", "/", noop).unwrap();
        assert_eq!(route.uri(), "");

        let route = router.route("GET|POST", "/", noop).unwrap();
        assert_eq!(route.methods(), &[Method::GET, Method::POST]);
        assert_eq!(route.parent(), Some(router));
    }

    #[test]
    fn test_register_route_errors() {
        let router = Router::default();
        assert_eq!(
            router.route("", "/uri", noop).unwrap_err(),
            RouterError::NoMethods("/uri".to_string())
        );
        assert!(matches!(
            router.route("GET", "/{id", noop),
            Err(RouterError::MalformedPattern { .. })
        ));
        assert!(router.routes().is_empty());
    }

    #[test]
    fn test_subrouter_inherits_by_reference() {
        let router = Router::default();
        router.middleware(middleware_passthrough());
        assert_eq!(router.middleware_len(), 4);

        let subrouter = router.subrouter("/sub").unwrap();
        assert!(router.subrouters().contains(&subrouter));
        assert_eq!(subrouter.middleware_len(), 0);
        assert_eq!(subrouter.status_handler_count(), router.status_handler_count());
        assert_eq!(subrouter.parent(), Some(router.clone()));

        let index = router.subrouter("/").unwrap();
        assert_eq!(index.prefix(), "");
    }

    fn middleware_passthrough() -> Middleware {
        crate::routing::middleware_fn(|next| next)
    }

    #[test]
    fn test_subrouter_handle_keeps_tree_alive() {
        let subrouter = Router::default().subrouter("/sub").unwrap();
        let executed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&executed);
        subrouter
            .get("/ping", move |response, _| {
                flag.store(true, Ordering::SeqCst);
                response.string(StatusCode::OK, "pong");
            })
            .unwrap();

        let writer = subrouter.root().serve_http(raw("GET", "/sub/ping"));
        assert!(executed.load(Ordering::SeqCst));
        assert_eq!(writer.body(), b"pong");
    }

    #[test]
    fn test_prefix_ends_on_segment_boundary() {
        let router = Router::default();
        let products = router.subrouter("/product").unwrap();
        products.get("", noop).unwrap().name("product.index").unwrap();

        let mut route_match = RouteMatch::new("/products");
        assert!(!router.match_request(&raw("GET", "/products"), &mut route_match));
        assert!(route_match.is_not_found());
    }

    #[test]
    fn test_prefix_parameters_are_captured() {
        let router = Router::default();
        let shop = router.subrouter("/shop/{shop}").unwrap();
        let show = shop.get("/item/{id:[0-9]+}", noop).unwrap();

        let mut route_match = RouteMatch::new("/shop/north/item/7");
        assert!(router.match_request(&raw("GET", "/shop/north/item/7"), &mut route_match));
        assert_eq!(route_match.route, show);
        assert_eq!(route_match.parameters["shop"], "north");
        assert_eq!(route_match.parameters["id"], "7");
    }

    #[test]
    fn test_failed_descent_restores_state() {
        let router = Router::default();
        let first = router.subrouter("/{section}").unwrap();
        first.get("/only", noop).unwrap();
        let fallback = router.get("/about/team", noop).unwrap();

        let mut route_match = RouteMatch::new("/about/team");
        assert!(router.match_request(&raw("GET", "/about/team"), &mut route_match));
        assert_eq!(route_match.route, fallback);
        assert!(route_match.parameters.is_empty());
    }

    #[test]
    fn test_full_match_wins_over_method_mismatch() {
        let router = Router::default();
        router.get("/item", noop).unwrap();
        let post = router.post("/item", noop).unwrap();

        let mut route_match = RouteMatch::new("/item");
        assert!(router.match_request(&raw("POST", "/item"), &mut route_match));
        assert_eq!(route_match.route, post);
    }

    #[test]
    fn test_cors_adds_options_once() {
        let router = Router::default();
        assert!(router.cors_options().is_none());

        router.cors(CorsOptions::default());
        router.cors(CorsOptions::default());
        assert!(router.cors_options().is_some());
        assert!(router.has_cors_middleware());
        assert_eq!(router.middleware_len(), 4);

        let route = router.route("GET|OPTIONS", "/cors", noop).unwrap();
        assert_eq!(route.methods(), &[Method::GET, Method::OPTIONS]);

        let subrouter = router.subrouter("/sub").unwrap();
        assert!(subrouter.has_cors_middleware());
        let nested = subrouter.get("/nested", noop).unwrap();
        assert_eq!(nested.methods(), &[Method::GET, Method::OPTIONS]);
    }

    #[test]
    fn test_status_handler_panic_leaves_bare_500() {
        let router = Router::default();
        router.status_handler(|_, _| panic!("broken status handler"), &[StatusCode::NOT_FOUND]);

        let writer = router.serve_http(raw("GET", "/missing"));
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_status_handler_runs_once() {
        let router = Router::default();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        router.status_handler(
            move |response, _| {
                *counter.lock().unwrap() += 1;
                response.status(StatusCode::IM_A_TEAPOT);
            },
            &[StatusCode::NOT_FOUND, StatusCode::IM_A_TEAPOT],
        );

        let writer = router.serve_http(raw("GET", "/missing"));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(writer.status(), StatusCode::IM_A_TEAPOT);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_unmapped_redirect_status_is_flushed_as_is() {
        let router = Router::default();
        router
            .get("/old", |response, _| response.redirect("/new"))
            .unwrap();

        let writer = router.serve_http(raw("GET", "/old"));
        assert_eq!(writer.status(), StatusCode::TEMPORARY_REDIRECT);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/user/john%20doe"), "/user/john doe");
        assert_eq!(decode_path("/caf%C3%A9"), "/café");
        assert_eq!(decode_path("/plain"), "/plain");
        // Not UTF-8 once decoded: matched as sent.
        assert_eq!(decode_path("/bad%FF"), "/bad%FF");
    }

    #[test]
    fn test_parse_methods() {
        assert_eq!(
            parse_methods("get| POST |GET", "/").unwrap(),
            vec![Method::GET, Method::POST]
        );
        assert_eq!(
            parse_methods("G ET", "/").unwrap_err(),
            RouterError::InvalidMethod("G ET".to_string())
        );
    }
}
