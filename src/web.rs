use std::{future::Future, io, sync::Arc};

use axum::{extract::State, http::StatusCode, response::Html, routing::get, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::trigger::Trigger;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub const SUCCESS_MESSAGE: &str = "LED turned on successfully!";

pub fn router(trigger: Arc<Trigger>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/turn_on_led", get(turn_on_led))
        .with_state(trigger)
}

/// Serve until `shutdown` resolves, then wait for in-flight requests to finish.
pub async fn serve(
    listener: TcpListener,
    trigger: Arc<Trigger>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    info!(addr = %listener.local_addr()?, "serving");
    axum::serve(listener, router(trigger))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn turn_on_led(State(trigger): State<Arc<Trigger>>) -> (StatusCode, String) {
    match trigger.turn_on_led().await {
        Ok(()) => {
            info!("LED turned on");
            (StatusCode::OK, SUCCESS_MESSAGE.to_string())
        }
        Err(err) => {
            warn!(%err, "failed to turn on LED");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error turning on LED: {err}"),
            )
        }
    }
}
