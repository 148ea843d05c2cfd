// src/main.rs
use anyhow::Result;
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use reachability_monitor::{
    command::{CommandHandler, SessionManager},
    config,
    health::PollingScheduler,
    metrics::MetricsRegistry,
    probe::{CheckHostProvider, ProbeClient},
    publisher::{LogPublisher, StatusBoard, StatusPublisher},
    registry::HostRegistry,
    transport::TelegramTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reachability_monitor=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path)?;

    // Initialize metrics
    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    // Core: registry, probe client, scheduler
    let registry = Arc::new(HostRegistry::new());
    let board = Arc::new(StatusBoard::new());

    let provider = Arc::new(CheckHostProvider::new(&config.probe)?);
    let client = Arc::new(ProbeClient::new(provider, &config.probe));
    info!(
        "Probing via {} from node {}",
        config.probe.base_url, config.probe.node
    );

    let publishers = vec![
        board.clone() as Arc<dyn StatusPublisher>,
        Arc::new(LogPublisher) as Arc<dyn StatusPublisher>,
    ];
    let scheduler = Arc::new(PollingScheduler::new(
        config.monitor.clone(),
        registry.clone(),
        client,
        publishers,
        Some(metrics),
    ));

    // Operator-facing transport
    let sessions = Arc::new(SessionManager::new(CommandHandler::new(registry, board)));
    let transport = Arc::new(TelegramTransport::new(&config.telegram, sessions)?);

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone()).await?;
    }

    let scheduler_task = tokio::spawn(scheduler.clone().run());
    let transport_task = tokio::spawn(transport.clone().run());

    shutdown_signal().await;

    scheduler.shutdown();
    transport.shutdown();

    let (scheduler_result, transport_result) = tokio::join!(scheduler_task, transport_task);
    if let Err(e) = scheduler_result {
        error!("Scheduler task failed: {}", e);
    }
    if let Err(e) = transport_result {
        error!("Transport task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

async fn start_metrics_server(
    addr: SocketAddr,
    registry: Arc<MetricsRegistry>,
    path: String,
) -> Result<()> {
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    let response = if req.uri().path() != path.as_str() {
                        text_response(StatusCode::NOT_FOUND, "Not Found")
                    } else {
                        match registry.gather() {
                            Ok(metrics) => {
                                let mut response = Response::new(Body::from(metrics));
                                response.headers_mut().insert(
                                    hyper::header::CONTENT_TYPE,
                                    hyper::header::HeaderValue::from_static(
                                        "text/plain; version=0.0.4",
                                    ),
                                );
                                response
                            }
                            Err(e) => {
                                error!("Failed to encode metrics: {}", e);
                                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
                            }
                        }
                    };

                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
