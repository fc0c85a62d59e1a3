//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from file serving.

pub mod cache;
pub mod cors;
pub mod encoding;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cors::apply_cors_headers;
pub use response::{
    build_304_response, build_404_response, build_501_response, build_error_response,
    build_file_response, build_html_response, build_redirect_response,
};
