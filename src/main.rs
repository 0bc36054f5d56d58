//! A small user lookup service whose logs flow through the OpenTelemetry log bridge.
//!
//! Run with: `cargo run`, then `curl -X GET localhost:8080/users -d '{"username":"Test"}' -H 'content-type: application/json'`

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use otel_log_bridge::{Attr, Logger};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";

/// The only known user.
const KNOWN_USER: UserResponse = UserResponse {
    id: "1",
    username: "Test",
    fullname: "Test dos Testes",
};

#[derive(Clone)]
struct AppState {
    logger: Logger,
}

#[derive(Debug, Deserialize)]
struct UserRequest {
    username: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct UserResponse {
    id: &'static str,
    username: &'static str,
    fullname: &'static str,
}

#[tokio::main]
async fn main() {
    // diagnostics of the pipeline itself, kept separate from the bridged logs
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let telemetry = match otel_log_bridge::configure().finish() {
        Ok(telemetry) => telemetry,
        Err(error) => {
            tracing::error!(%error, "failed to configure the log bridge");
            std::process::exit(1);
        }
    };
    let (logger, guard) = telemetry.into_parts();

    let address =
        std::env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string());

    logger.info(&format!("Start Service: {address}"), []);

    if let Err(error) = serve(&address, app(logger.clone())).await {
        logger.error(
            "could not start the server",
            [Attr::new("error", error.to_string())],
        );
        guard.shutdown();
        std::process::exit(1);
    }

    logger.info("Service stopped", []);
    guard.shutdown();
}

fn app(logger: Logger) -> Router {
    Router::new()
        .route("/users", get(get_user))
        .with_state(AppState { logger })
}

async fn serve(address: &str, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

async fn get_user(
    State(state): State<AppState>,
    request: Result<Json<UserRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) if !request.username.is_empty() => request,
        Ok(_) => return bad_request(&state.logger, "username is required"),
        Err(rejection) => return bad_request(&state.logger, &rejection.body_text()),
    };

    if request.username != KNOWN_USER.username {
        state.logger.error(
            &format!("user not found, username: {}", request.username),
            [],
        );
        return (StatusCode::NOT_FOUND, Json("Error not found")).into_response();
    }

    (StatusCode::OK, Json(KNOWN_USER)).into_response()
}

fn bad_request(logger: &Logger, error: &str) -> Response {
    logger.error("JSON Bind error", [Attr::new("error", error)]);
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": error })),
    )
        .into_response()
}
