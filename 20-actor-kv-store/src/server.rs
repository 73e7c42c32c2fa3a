use std::{future::Future, net::SocketAddr, time::Duration};

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{command::RequestContext, error::StoreError, processor::StoreHandle};

/// HTTP front end for a string-valued store.
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    pub fn new(
        listener: TcpListener,
        store: StoreHandle<String>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            listener,
            router: router(store, request_timeout),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until `shutdown` resolves, then waits for in-flight
    /// requests to finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server { listener, router } = self;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("server stopped");
        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

/// Builds the `/get`, `/put` and `/delete` routes over `store`.
///
/// When `request_timeout` is set, every request carries a deadline that far
/// out; requests still queued past it get a 504.
pub fn router(store: StoreHandle<String>, request_timeout: Option<Duration>) -> Router {
    let state = AppState {
        store,
        request_timeout,
    };

    Router::new()
        .route("/get", any(get_value))
        .route("/put", any(put_value))
        .route("/delete", any(delete_value))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Clone)]
struct AppState {
    store: StoreHandle<String>,
    request_timeout: Option<Duration>,
}

impl AppState {
    fn context(&self) -> RequestContext {
        match self.request_timeout {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::background(),
        }
    }
}

// Absent query parameters read as empty strings, so `/get` alone looks up the empty key.
#[derive(Debug, Deserialize)]
struct KeyParams {
    #[serde(default)]
    key: String,
}

#[derive(Debug, Deserialize)]
struct PutParams {
    #[serde(default)]
    key: String,
    #[serde(default)]
    val: String,
}

async fn get_value(
    State(state): State<AppState>,
    Query(params): Query<KeyParams>,
) -> Result<String, StoreError> {
    let value = state.store.get(state.context(), params.key).await?;
    debug!(%value, "get served");
    Ok(value)
}

async fn put_value(
    State(state): State<AppState>,
    Query(params): Query<PutParams>,
) -> Result<&'static str, StoreError> {
    state
        .store
        .put(state.context(), params.key, params.val)
        .await?;
    Ok("ok")
}

async fn delete_value(
    State(state): State<AppState>,
    Query(params): Query<KeyParams>,
) -> Result<&'static str, StoreError> {
    state.store.delete(state.context(), params.key).await?;
    Ok("ok")
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            StoreError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            warn!(error = %self, "store request failed");
        }
        (status, self.to_string()).into_response()
    }
}
