//! Access log format module
//!
//! Entries are written in Common Log Format (CLF):
//! `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`

use chrono::Local;
use hyper::Version;

/// Access log entry containing request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request URI as sent, including the query string
    pub uri: String,
    /// HTTP version (1.0, 1.1)
    pub http_version: &'static str,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes, `None` when nothing was sent
    pub body_bytes: Option<u64>,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, uri: String, version: Version) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            uri,
            http_version: version_str(version),
            status: 200,
            body_bytes: None,
        }
    }

    /// Format the entry as a Common Log Format line
    pub fn format(&self) -> String {
        let bytes = match self.body_bytes {
            Some(n) if n > 0 => n.to_string(),
            _ => "-".to_string(),
        };
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.uri,
            self.http_version,
            self.status,
            bytes,
        )
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
