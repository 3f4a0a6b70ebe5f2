//! HTTP surface: Prometheus metrics and the healthcheck endpoint.

use crate::REGISTRY;
use eralink_types::ReporterStatus;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::Encoder;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Handle incoming HTTP requests.
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    status: watch::Receiver<ReporterStatus>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => {
            let encoder = prometheus::TextEncoder::new();
            let metric_families = REGISTRY.gather();

            let mut buffer = Vec::new();
            if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                error!("Failed to encode metrics: {}", e);
                return Ok(Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::from("Failed to encode metrics")))
                    .expect("static response"));
            }

            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", encoder.format_type())
                .body(Full::new(Bytes::from(buffer)))
                .expect("static response"))
        }
        "/healthcheck" => {
            let body = serde_json::json!({ "status": status.borrow().as_str() });
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(body.to_string())))
                .expect("static response"))
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response")),
    }
}

/// Run the health/metrics HTTP server until the task is cancelled.
pub async fn start_health_server(
    addr: SocketAddr,
    status: watch::Receiver<ReporterStatus>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Health server listening on http://{}/healthcheck", addr);

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let status = status.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, status.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving health connection: {}", e);
            }
        });
    }
}

/// Start the health server in the background.
pub fn spawn_health_server(
    addr: SocketAddr,
    status: watch::Receiver<ReporterStatus>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_health_server(addr, status).await {
            error!("Health server error: {}", e);
        }
    })
}
