//! Directory listing generation

use crate::http::encoding::{escape_html, percent_encode_path};
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;

/// One directory entry as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    /// True for directories and for symlinks pointing at directories
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Read a directory and render its listing page
///
/// `display_path` is the decoded request path shown in the title.
pub async fn list_directory(dir: &Path, display_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry
            .file_type()
            .await
            .is_ok_and(|t| t.is_symlink());
        // Follows symlinks; broken links count as files
        let is_dir = fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());
        entries.push(ListingEntry {
            name,
            is_dir,
            is_symlink,
        });
    }

    Ok(render_listing(display_path, entries))
}

/// Render listing HTML, entries sorted case-insensitively
pub fn render_listing(display_path: &str, mut entries: Vec<ListingEntry>) -> String {
    entries.sort_by_cached_key(|e| e.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>");
    let _ = writeln!(html, "<h1>{title}</h1>\n<hr>\n<ul>");

    for entry in &entries {
        let mut display_name = entry.name.clone();
        let mut link_name = entry.name.clone();
        if entry.is_dir {
            display_name.push('/');
            link_name.push('/');
        }
        if entry.is_symlink {
            display_name = format!("{}@", entry.name);
        }
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            percent_encode_path(&link_name),
            escape_html(&display_name)
        );
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}
