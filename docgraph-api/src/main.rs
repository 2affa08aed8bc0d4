//! Docgraph API Main Entry Point
//!
//! Loads the seed documents and answers requests given either as arguments or as lines on
//! standard input (`[METHOD] <target>`), printing one JSON reply per request.

use docgraph_api::{ApiConfig, ApiRequest, Dependencies, Method, ServerError};
use dotenv::dotenv;
use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docgraph_api=info,docgraph_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so replies on stdout stay parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| ServerError::config(format!("Failed to initialize tracing: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .pretty(),
            )
            .try_init()
            .map_err(|e| ServerError::config(format!("Failed to initialize tracing: {}", e)))?;
    }

    info!(
        service_name = "docgraph-api",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );

    Ok(())
}

/// Parse `"[METHOD] <target>"`. A bare target is a GET.
fn parse_line(line: &str) -> Option<(Method, &str)> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    match parts.next() {
        Some(target) => Some((Method::parse(first), target)),
        None => Some((Method::Get, first)),
    }
}

async fn serve(deps: &Dependencies, authorization: Option<&str>, line: &str) {
    let Some((method, target)) = parse_line(line) else {
        return;
    };

    let request = match ApiRequest::new(method, target) {
        Ok(request) => request.with_header("host", deps.host.clone()),
        Err(e) => {
            warn!(target_path = %target, error = %e, "Unparseable request");
            println!(
                "{}",
                serde_json::json!({ "status": e.status_code(), "body": e.status_message() })
            );
            return;
        }
    };
    let request = match authorization {
        Some(value) => request.with_header("authorization", value),
        None => request,
    };

    let reply = deps.api.respond(&request).await;
    println!(
        "{}",
        serde_json::json!({ "status": reply.status, "body": reply.body })
    );
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting docgraph API");

    let config = ApiConfig::from_env();
    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let authorization = env::var("DOCGRAPH_AUTHORIZATION").ok();
    let targets: Vec<String> = env::args().skip(1).collect();

    if !targets.is_empty() {
        for target in &targets {
            serve(&deps, authorization.as_deref(), target).await;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        serve(&deps, authorization.as_deref(), &line).await;
    }

    info!("Input closed, shutting down");
    Ok(())
}
