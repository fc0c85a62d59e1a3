//! Static file serving module
//!
//! Maps request paths onto the document root and serves files, index pages
//! and directory listings.

use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, encoding, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncReadExt;

const FILE_NOT_FOUND: &str = "File not found";

/// Translate a URL path into a filesystem path below `root`
///
/// The path is percent-decoded and normalized: empty and `.` segments are
/// dropped, `..` removes the previous segment but never climbs above the
/// root, and segments that still contain a separator are skipped.
pub fn translate_path(root: &Path, url_path: &str) -> PathBuf {
    let decoded = encoding::percent_decode(url_path);
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\\') || s.contains(std::path::MAIN_SEPARATOR) => {}
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(segments);
    path
}

/// Serve the request path from the document root
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    root: &Path,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    let trailing_slash = ctx.path.ends_with('/');
    let path = translate_path(root, ctx.path);

    let Ok(metadata) = fs::metadata(&path).await else {
        return http::build_404_response(FILE_NOT_FOUND, ctx.is_head);
    };

    if !is_within_root(root, &path).await {
        logger::log_warning(&format!(
            "Path outside document root blocked: {}",
            ctx.path
        ));
        return http::build_404_response(FILE_NOT_FOUND, ctx.is_head);
    }

    if metadata.is_dir() {
        if !trailing_slash {
            return http::build_redirect_response(&redirect_location(ctx.path, ctx.query));
        }
        for index_file in index_files {
            let index_path = path.join(index_file);
            if fs::metadata(&index_path).await.is_ok_and(|m| m.is_file())
                && is_within_root(root, &index_path).await
            {
                return serve_file(ctx, &index_path).await;
            }
        }
        return serve_listing(ctx, &path).await;
    }

    // A file addressed as a directory does not exist
    if trailing_slash {
        return http::build_404_response(FILE_NOT_FOUND, ctx.is_head);
    }

    serve_file(ctx, &path).await
}

/// Serve a regular file, honoring `If-Modified-Since`
async fn serve_file(ctx: &RequestContext<'_>, path: &Path) -> Response<Full<Bytes>> {
    let mut file = match fs::File::open(path).await {
        Ok(f) => f,
        Err(e) => return io_error_response(path, &e, ctx.is_head),
    };
    let metadata = match file.metadata().await {
        Ok(m) => m,
        Err(e) => return io_error_response(path, &e, ctx.is_head),
    };

    let last_modified =
        cache::last_modified(metadata.modified().unwrap_or_else(|_| SystemTime::now()));
    if cache::is_not_modified(
        ctx.if_modified_since.as_deref(),
        ctx.has_if_none_match,
        last_modified,
    ) {
        return http::build_304_response(last_modified);
    }

    let content_type = mime::content_type_for(path);
    if ctx.is_head {
        return http::build_file_response(Bytes::new(), metadata.len(), content_type, last_modified);
    }

    let mut content = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or(0));
    if let Err(e) = file.read_to_end(&mut content).await {
        return io_error_response(path, &e, ctx.is_head);
    }

    let content_length = content.len() as u64;
    http::build_file_response(Bytes::from(content), content_length, content_type, last_modified)
}

/// Serve a generated listing for a directory
async fn serve_listing(ctx: &RequestContext<'_>, dir: &Path) -> Response<Full<Bytes>> {
    let display_path = encoding::percent_decode(ctx.path);
    match listing::list_directory(dir, &display_path).await {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response("No permission to list directory", ctx.is_head)
        }
    }
}

/// Check that the canonical form of `path` stays inside the canonical root
async fn is_within_root(root: &Path, path: &Path) -> bool {
    fs::canonicalize(path)
        .await
        .is_ok_and(|canonical| canonical.starts_with(root))
}

/// Collapse a run of leading slashes into one
///
/// Keeps `//host/dir` from turning into a protocol-relative redirect.
pub fn collapse_leading_slashes(path: &str) -> &str {
    let rest = path.trim_start_matches('/');
    let slashes = path.len() - rest.len();
    if slashes > 1 {
        &path[slashes - 1..]
    } else {
        path
    }
}

fn redirect_location(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{path}/?{q}"),
        None => format!("{path}/"),
    }
}

/// Map a file I/O failure onto an error status
fn io_error_response(path: &Path, err: &std::io::Error, is_head: bool) -> Response<Full<Bytes>> {
    match err.kind() {
        ErrorKind::NotFound => http::build_404_response(FILE_NOT_FOUND, is_head),
        ErrorKind::PermissionDenied => {
            logger::log_warning(&format!(
                "Permission denied reading '{}'",
                path.display()
            ));
            http::build_error_response(StatusCode::FORBIDDEN, Some("Permission denied"), is_head)
        }
        _ => {
            logger::log_error(&format!("Failed to read file '{}': {err}", path.display()));
            http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, None, is_head)
        }
    }
}
