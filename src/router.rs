/// gigboard router
///
/// This module provides the routing and HTTP plumbing of the directory:
///
/// - Method, path and parameter-based routing (`/venues/:venue_id/edit`)
/// - Global and route-specific middleware (pre and post)
/// - Mapping of handler errors onto the 404 and 500 pages
///
/// Requests are accepted by axum and dispatched through the route table in
/// registration order, so fixed paths such as `/venues/create` must be
/// registered before `/venues/:venue_id`.
use crate::error::{Error, Result};
use crate::forms::FormData;
use crate::orm::Db;
use crate::settings::Settings;
use crate::{flash, template};
use axum::extract::{Form, FromRequest};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub settings: Settings,
}

/// Represents the outcome of an HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    /// Messages to show on the next rendered page
    pub flashes: Vec<String>,
}

impl Response {
    /// Construct a new HTTP 200 response with a plain body.
    pub fn ok(body: impl Into<String>) -> Self {
        Response {
            status_code: 200,
            body: body.into(),
            headers: HashMap::new(),
            flashes: Vec::new(),
        }
    }

    /// HTTP 200 with an HTML content type.
    pub fn html(body: impl Into<String>) -> Self {
        Response::ok(body).with_header("Content-Type", "text/html; charset=utf-8")
    }

    /// Construct a new HTTP 404 "not found" response.
    pub fn not_found() -> Self {
        Response::ok("404 Not Found").with_status(404)
    }

    pub fn method_not_allowed() -> Self {
        Response::ok("405 Method Not Allowed").with_status(405)
    }

    /// `303 See Other` to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Response::ok(String::new())
            .with_status(303)
            .with_header("Location", location)
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn flash(mut self, message: impl Into<String>) -> Self {
        self.flashes.push(message.into());
        self
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();
        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => log::warn!("Dropping invalid response header `{}`", name),
            }
        }
        response
    }
}

/// Holds metadata about the current HTTP request and its extracted path parameters.
/// Middleware can modify/read this context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    /// Flash messages that arrived with the request
    pub flashes: Vec<String>,
    pub start_time: Option<Instant>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RequestContext {
            method,
            path: path.into(),
            params: HashMap::new(),
            flashes: Vec::new(),
            start_time: None,
        }
    }
}

/// What a handler receives: path parameters, the decoded form (query string
/// for GET) and the pending flash messages.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub params: HashMap<String, String>,
    pub form: FormData,
    pub flashes: Vec<String>,
}

impl Request {
    /// Integer path parameter; anything else is a 404.
    pub fn id_param(&self, name: &str) -> Result<i64> {
        self.params
            .get(name)
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| Error::not_found(format!("no such {name}")))
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

/// Type alias for async handler functions for HTTP routes.
pub type Handler = Arc<dyn Fn(Request, AppState) -> HandlerFuture + Send + Sync>;

/// Type alias for synchronous, pre-processing middleware executed before the handler.
/// If a middleware returns Some(Response), request handling stops and this response is sent.
pub type Middleware = Arc<dyn Fn(&mut RequestContext) -> Option<Response> + Send + Sync>;

/// Type alias for post-processing middleware executed after the handler.
/// Post-middleware can inspect/modify the response before it is sent.
pub type PostMiddleware = Arc<dyn Fn(&RequestContext, Response) -> Response + Send + Sync>;

/// Wrap an async fn into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request, AppState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    Arc::new(move |req: Request, state: AppState| -> HandlerFuture { Box::pin(f(req, state)) })
}

/// Represents a registered HTTP route and its associated handler + middleware.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path_pattern: String,
    pub handler: Handler,
    pub middlewares: Vec<Middleware>,
}

/// Outcome of looking a request up in the route table.
pub enum RouteMatch<'a> {
    Found(&'a Route, HashMap<String, String>),
    MethodNotAllowed,
    NotFound,
}

/// The application router: HTTP routes and global middleware.
#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
    pub middlewares: Vec<Middleware>,
    pub post_middlewares: Vec<PostMiddleware>,
    pub app_state: Option<AppState>,
}

impl Router {
    /// Create a new, empty application router.
    pub fn new() -> Self {
        Router::default()
    }

    /// Register an HTTP route with method, path pattern, handler, and any route-specific middleware.
    pub fn add_route(
        &mut self,
        method: Method,
        path_pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) {
        self.routes.push(Route {
            method,
            path_pattern: path_pattern.to_string(),
            handler,
            middlewares,
        });
    }

    /// Add a global pre-middleware to be run before all HTTP handlers.
    pub fn add_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    /// Add a post-middleware to be run after each HTTP handler.
    pub fn add_post_middleware(&mut self, middleware: PostMiddleware) {
        self.post_middlewares.push(middleware);
    }

    pub fn set_app_state(&mut self, state: AppState) {
        self.app_state = Some(state);
    }

    /// First route whose pattern and method match.
    pub fn find_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut path_matched = false;
        for route in &self.routes {
            if let Some(params) = match_path(&route.path_pattern, path) {
                if route.method == *method {
                    return RouteMatch::Found(route, params);
                }
                path_matched = true;
            }
        }
        if path_matched {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }

    /// Run middleware, the matched handler and post-middleware for one request.
    pub async fn handle(&self, mut ctx: RequestContext, form: FormData, state: AppState) -> Response {
        for middleware in &self.middlewares {
            if let Some(response) = (middleware)(&mut ctx) {
                return response;
            }
        }

        let mut response = match self.find_route(&ctx.method, &ctx.path) {
            RouteMatch::Found(route, params) => {
                ctx.params = params;
                let mut early = None;
                for middleware in &route.middlewares {
                    if let Some(response) = (middleware)(&mut ctx) {
                        early = Some(response);
                        break;
                    }
                }
                match early {
                    Some(response) => response,
                    None => {
                        let request = Request {
                            params: ctx.params.clone(),
                            form,
                            flashes: ctx.flashes.clone(),
                        };
                        match (route.handler)(request, state.clone()).await {
                            Ok(response) => response,
                            Err(e) => error_page(&e, &state, &ctx.flashes),
                        }
                    }
                }
            }
            RouteMatch::MethodNotAllowed => Response::method_not_allowed(),
            RouteMatch::NotFound => error_page(
                &Error::not_found(format!("{} {}", ctx.method, ctx.path)),
                &state,
                &ctx.flashes,
            ),
        };

        for post_middleware in &self.post_middlewares {
            response = (post_middleware)(&ctx, response);
        }
        response
    }

    /// Build the axum service that feeds every request through this router.
    pub fn into_axum(self) -> Result<axum::Router> {
        let state = self
            .app_state
            .clone()
            .ok_or_else(|| Error::Config("App state not set in Router".to_string()))?;
        let router = Arc::new(self);
        Ok(axum::Router::new().fallback(move |req: axum::extract::Request| {
            let router = router.clone();
            let state = state.clone();
            async move { serve_request(router, state, req).await }
        }))
    }

    /// Bind `settings.host:settings.port` and serve until the process stops.
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let addr = settings.bind_addr();
        let app = self.into_axum()?;
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;
        log::info!("HTTP Server running on http://{}", addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(())
    }
}

async fn serve_request(
    router: Arc<Router>,
    state: AppState,
    req: axum::extract::Request,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let flashes = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(flash::from_cookie_header)
        .unwrap_or_default();

    // GET reads the query string, other methods a urlencoded body
    let form = match Form::<Vec<(String, String)>>::from_request(req, &()).await {
        Ok(Form(pairs)) => FormData::new(pairs),
        Err(rejection) => {
            log::debug!("No form data for {} {}: {}", method, path, rejection);
            FormData::default()
        }
    };

    let mut ctx = RequestContext::new(method, path);
    ctx.flashes = flashes;
    router.handle(ctx, form, state).await
}

/// Render the status page for an error that reached the dispatcher.
pub fn error_page(err: &Error, state: &AppState, flashes: &[String]) -> Response {
    let status = err.status_code();
    let template_name = match status {
        404 => {
            log::info!("{}", err);
            "errors/404.html"
        }
        _ => {
            log::error!("Unhandled error: {}", err);
            "errors/500.html"
        }
    };
    let mut context = HashMap::new();
    context.insert(
        "messages".to_string(),
        template::TemplateValue::List(flashes.iter().map(|m| m.as_str().into()).collect()),
    );
    match template::render_template(&state.settings.template.dir, template_name, &context) {
        Ok(body) => Response::html(body).with_status(status),
        Err(e) => {
            log::error!("Could not render error page: {}", e);
            match status {
                404 => Response::not_found(),
                _ => Response::ok("500 Internal Server Error").with_status(500),
            }
        }
    }
}

#[macro_export]
macro_rules! route {
    ($router:expr, $( $method:ident $path:expr => { $handler:expr $(, $middleware:expr )* } ),* $(,)?) => {
        $(
            $router.add_route(
                ::axum::http::Method::$method,
                $path,
                $crate::router::handler($handler),
                vec![$($middleware),*]
            );
        )*
    };
}

/// Matches a path pattern (e.g. `/foo/:id`) against a real path,
/// extracting parameters into a HashMap if matched, or None if not.
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (p, a) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(name) = p.strip_prefix(':') {
            if a.is_empty() {
                return None;
            }
            params.insert(name.to_string(), a.to_string());
        } else if p != a {
            return None;
        }
    }

    Some(params)
}
