//! Request handler module
//!
//! Responsible for request dispatch, static file serving and directory listings.

pub mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
