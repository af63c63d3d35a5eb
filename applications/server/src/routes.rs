/// HTTP router
use crate::{api, error::ServerError, state::AppState};
use axum::{
    handler::Handler,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use std::any::Any;
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// The service handed to `axum::serve`: the router behind trailing-slash trimming
pub type App = NormalizePath<Router>;

const NO_CACHE: &str = "no-cache, no-store, no-transform, must-revalidate, private, max-age=0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

/// One method on one path, and the handler serving it
pub struct Endpoint {
    pub verb: Verb,
    pub path: &'static str,
    service: MethodRouter<AppState>,
}

fn endpoint<H, T>(verb: Verb, path: &'static str, handler: H) -> Endpoint
where
    H: Handler<T, AppState>,
    T: 'static,
{
    Endpoint {
        verb,
        path,
        service: on(verb.filter(), handler),
    }
}

/// Every endpoint the service exposes; the router is built from this table
pub fn endpoints() -> Vec<Endpoint> {
    vec![
        endpoint(Verb::Get, "/ping", api::health::ping),
        endpoint(Verb::Get, "/health", api::health::health),
        endpoint(Verb::Post, "/v1/users", api::users::create_user),
        endpoint(Verb::Get, "/v1/users", api::users::list_users),
        endpoint(Verb::Get, "/v1/users/:id", api::users::get_user),
        endpoint(Verb::Put, "/v1/users/:id", api::users::update_user),
        endpoint(Verb::Delete, "/v1/users/:id", api::users::delete_user),
    ]
}

pub fn create_router(app_state: AppState) -> App {
    let router = endpoints()
        .into_iter()
        .fold(Router::new(), |router, endpoint| {
            router.route(endpoint.path, endpoint.service)
        });

    with_middleware(router.with_state(app_state))
}

/// Wrap a router in the middleware stack every response goes through
///
/// Outermost first: trailing-slash trimming, request id, tracing, request id
/// propagation, `Cache-Control: no-cache` and panic recovery.
pub fn with_middleware(router: Router) -> App {
    let router = router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    ServerError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Log the route table at startup
pub fn log_routes() {
    for endpoint in endpoints() {
        tracing::info!("Route {:<6} {}", endpoint.verb.as_str(), endpoint.path);
    }
}
