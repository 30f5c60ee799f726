//! Live status surface: HTML page, plain-text status line and a PNG of the current best.
//!
//! Handlers hold the best-state lock only while cloning the snapshot; rendering and PNG
//! encoding run afterwards on the blocking pool.

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::app_types::BestHandle;
use crate::error::TraceError;
use crate::export::{encode_png, status_html, status_line};

/// Shared server state: a read-only view of the engine's best result.
#[derive(Clone)]
pub struct ServerState {
    pub best: BestHandle,
}

/// Create the status router with shared state.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/status", get(status_page))
        .route("/status.txt", get(status_text))
        .route("/best.png", get(best_png))
        .with_state(state)
}

async fn status_page(State(state): State<ServerState>) -> Html<String> {
    let snapshot = state.best.snapshot();
    Html(status_html(&snapshot, state.best.elapsed()))
}

async fn status_text(State(state): State<ServerState>) -> String {
    let snapshot = state.best.snapshot();
    let mut line = status_line(&snapshot, state.best.elapsed());
    line.push('\n');
    line
}

async fn best_png(State(state): State<ServerState>) -> Response {
    let snapshot = state.best.snapshot();
    match tokio::task::spawn_blocking(move || encode_png(&snapshot)).await {
        Ok(Ok(bytes)) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Ok(Err(e)) => {
            tracing::error!("failed to encode snapshot: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            tracing::error!("snapshot task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, state: ServerState, shutdown: F) -> Result<(), TraceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("status page at http://{}/status", listener.local_addr()?);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::Circle;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> ServerState {
        let best = BestHandle::new(5, 4);
        best.update(|s| {
            s.circles.push(Circle::new(2, 2, 3, 200, [250, 10, 10]));
            s.score = 1234;
            s.generation = 77;
            s.improved_at = 70;
        });
        ServerState { best }
    }

    async fn get_body(uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = create_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_status_page() {
        let (status, content_type, body) = get_body("/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Generation: 77"));
        assert!(html.contains("Score: 1234"));
        assert!(html.contains("/best.png"));
    }

    #[tokio::test]
    async fn test_status_text() {
        let (status, _, body) = get_body("/status.txt").await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("generation=77 score=1234 circles=1 elapsed="));
    }

    #[tokio::test]
    async fn test_best_png() {
        let (status, content_type, body) = get_body("/best.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        let img = image::load_from_memory(&body).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (5, 4));
        // 250*200 >> 8 = 195, 10*200 >> 8 = 7
        assert_eq!(img.get_pixel(2, 2).0, [195, 7, 7]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _, _) = get_body("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
