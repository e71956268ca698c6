use axum::{
    body::Bytes,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use http_logger::{env, HttpLoggerLayer, TracingLogger, LOG_PATH_ENV};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

// Demo server handlers
async fn hello_handler() -> impl IntoResponse {
    "Hello, World!"
}

async fn echo_handler(body: Bytes) -> impl IntoResponse {
    format!("Echo: {}", String::from_utf8_lossy(&body))
}

async fn orders_handler() -> impl IntoResponse {
    (StatusCode::CREATED, r#"{"ok":true}"#)
}

async fn fail_handler() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    if std::env::var_os(LOG_PATH_ENV).is_none() {
        std::env::set_var(LOG_PATH_ENV, "logs");
    }

    // The block a host runtime would hand over from its extra-config file.
    let extra = json!({
        "http-logger": {
            "is_show_on_stdout": env::bool_or("IS_SHOW_ON_STDOUT", true)
        }
    });
    let layer = HttpLoggerLayer::register(&extra, Arc::new(TracingLogger))?;

    let app = Router::new()
        .route("/hello", get(hello_handler))
        .route("/echo", post(echo_handler))
        .route("/orders", get(orders_handler))
        .route("/fail", get(fail_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(layer)
                .into_inner(),
        );

    info!("Demo server endpoints:");
    info!("  GET  /hello   - Simple greeting");
    info!("  POST /echo    - Echo request body");
    info!("  GET  /orders  - 201 with a JSON body");
    info!("  GET  /fail    - 500, recorded with LOG-LEVEL: ERROR");
    info!("");
    info!("Try these commands:");
    info!("  curl 'http://localhost:3000/orders?id=7'");
    info!("  curl -X POST -d 'Hello from client' http://localhost:3000/echo");
    info!("  curl http://localhost:3000/fail");
    info!("then look at the http-logger-*.log files under ./logs");

    let addr = env::string_or("DEMO_ADDR", "0.0.0.0:3000");
    let listener = TcpListener::bind(&addr).await?;
    info!("Demo server listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
