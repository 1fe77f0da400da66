use std::path::Path;

use axum::body::Body;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use cardpress::error;
use cardpress::error::{Chainable, Result};

use crate::util::inject_script;

/// The live reload WebSocket endpoint.
pub const RELOAD_PATH: &str = "/__livereload";

/// The message sent to browsers after each render.
pub const RELOAD_MESSAGE: &str = "reload";

const RELOAD_SCRIPT: &str = r#"<script>
(() => {
  const scheme = location.protocol === "https:" ? "wss:" : "ws:";
  const socket = new WebSocket(`${scheme}//${location.host}/__livereload`);
  socket.addEventListener("message", (event) => {
    if (event.data === "reload") location.reload();
  });
})();
</script>
"#;

/// Serves every file in `root`, plus the live reload socket. Each message
/// on `reload` reloads every connected page.
pub fn router(root: &Path, reload: broadcast::Sender<()>) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(livereload))
        .fallback_service(ServeDir::new(root))
        .layer(middleware::map_response(inject_reload_script))
        .layer(TraceLayer::new_for_http())
        .with_state(reload)
}

pub async fn serve(addr: &str, root: &Path, reload: broadcast::Sender<()>) -> Result<()> {
    let listener = TcpListener::bind(addr).await
        .chain_with(|| error!("failed to bind server address", "address" => addr))?;

    tracing::info!(%addr, "serving deck at http://{addr}/");
    axum::serve(listener, router(root, reload)).await?;
    Ok(())
}

async fn livereload(ws: WebSocketUpgrade, State(reload): State<broadcast::Sender<()>>) -> Response {
    let rx = reload.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, rx))
}

async fn push_reloads(mut socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    tracing::debug!("live reload client connected");
    loop {
        tokio::select! {
            reload = rx.recv() => match reload {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    if socket.send(Message::Text(RELOAD_MESSAGE.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("live reload client disconnected");
}

async fn inject_reload_script(response: Response) -> Response {
    let is_html = response.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"));

    if response.status() != StatusCode::OK || !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let html = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(inject_script(&html, RELOAD_SCRIPT.as_bytes())))
}
