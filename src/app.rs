use std::net::SocketAddr;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::gate;
use crate::state::AppState;
use crate::web::session;
use crate::{auth, records, users, web};

pub fn build_app(state: AppState) -> Router {
    // Bearer-gated JSON API and cookie-gated form flow, converging on the
    // same verify-and-resolve core.
    let api = Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(records::router())
        .layer(middleware::from_fn_with_state(state.clone(), gate::api_gate));

    let site = Router::new()
        .merge(web::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::web_gate,
        ));

    Router::new()
        .merge(api)
        .merge(site)
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
