//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to
//! the static handler and response finalization.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, cache};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, DATE, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub has_if_none_match: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut entry = state.config.logging.access_log.then(|| {
        AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().to_string(),
            req.version(),
        )
    });

    let (parts, _) = req.into_parts();
    let response = route_request(&parts, &state).await;
    let response = finalize_response(response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact();
        logger::log_access(entry);
    }

    Ok(response)
}

/// Dispatch a request by method
async fn route_request(req: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    let method = &req.method;
    if method != Method::GET && method != Method::HEAD {
        logger::log_warning(&format!("Unsupported method: {method}"));
        return http::build_501_response(method.as_str());
    }

    let ctx = RequestContext {
        path: static_files::collapse_leading_slashes(req.uri.path()),
        query: req.uri.query(),
        is_head: method == Method::HEAD,
        if_modified_since: req
            .headers
            .get("if-modified-since")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        has_if_none_match: req.headers.contains_key("if-none-match"),
    };

    static_files::serve_path(&ctx, &state.root, &state.config.http.index_files).await
}

/// Add the common headers, then the CORS headers as the very last step
///
/// Every response leaving the handler passes through here, error pages included.
fn finalize_response(
    mut response: Response<Full<Bytes>>,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&cache::http_date_now()) {
        headers.insert(DATE, value);
    }
    http::apply_cors_headers(response)
}
