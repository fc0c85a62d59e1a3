use std::process::ExitCode;

use clap::Parser;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use crate::error::ServerError;
use crate::server::Server;

/// Serve the current directory over HTTP with permissive CORS headers
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Port to listen on (all interfaces)
    #[arg(value_name = "PORT")]
    port: Option<u16>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ServerError> {
    let cfg = config::Config::load(args.port)?;
    let root = std::env::current_dir()?;

    // Create Tokio runtime, worker count from config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async move {
        let server = Server::bind(cfg, root)?;
        server.run().await
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_argument_optional() {
        let args = Args::try_parse_from(["cors_static_server"]).unwrap();
        assert_eq!(args.port, None);
        let cfg = config::Config::load(args.port).unwrap();
        assert_eq!(cfg.server.port, 8877);
    }

    #[test]
    fn test_port_argument_parsed() {
        let args = Args::try_parse_from(["cors_static_server", "9999"]).unwrap();
        assert_eq!(args.port, Some(9999));
        let cfg = config::Config::load(args.port).unwrap();
        assert_eq!(cfg.server.port, 9999);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Args::try_parse_from(["cors_static_server", "http"]).is_err());
        assert!(Args::try_parse_from(["cors_static_server", "70000"]).is_err());
        assert!(Args::try_parse_from(["cors_static_server", "80", "81"]).is_err());
    }
}
