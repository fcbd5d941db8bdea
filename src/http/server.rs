//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the admission handler on every GET path
//! - Wire up middleware (tracing, request ID, concurrency bound, timeout)
//! - Extract the client id and hand it to the admission controller
//! - Map the decision to 200 / 503, malformed ids to 400
//! - Run the expired-session sweeper alongside the listener

use axum::{
    extract::{RawQuery, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admission::{AdmissionController, AdmissionPolicy, Decision, SessionSweeper};
use crate::config::GateConfig;
use crate::http::request::{extract_client_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AdmissionController>,
    pub client_id_param: Arc<str>,
}

/// HTTP front end of the admission gate.
pub struct GateServer {
    router: Router,
    config: GateConfig,
    controller: Arc<AdmissionController>,
}

impl GateServer {
    /// Create a server with a fresh controller built from `config`.
    pub fn new(config: GateConfig) -> Self {
        let controller = Arc::new(AdmissionController::new(AdmissionPolicy::from(
            &config.admission,
        )));
        Self::with_controller(config, controller)
    }

    /// Create a server around an existing controller.
    pub fn with_controller(config: GateConfig, controller: Arc<AdmissionController>) -> Self {
        let state = AppState {
            controller: controller.clone(),
            client_id_param: Arc::from(config.admission.client_id_param.as_str()),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            controller,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(admit_handler))
            .route("/{*path}", get(admit_handler))
            .with_state(state);
        with_middleware(router, config)
    }

    /// Run until `shutdown` fires, then stop accepting and drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = SessionSweeper::new(
            self.controller.clone(),
            Duration::from_secs(self.config.admission.sweep_interval_secs),
        );
        let sweeper_task = tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining in-flight requests");
            })
            .await;
        // `resubscribe` starts the sweeper's receiver empty, so a signal already
        // queued on `shutdown` before `run` began never reaches the sweeper.
        sweeper_task.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn controller(&self) -> Arc<AdmissionController> {
        self.controller.clone()
    }
}

/// Wrap `router` in the gate's middleware stack, outermost first.
///
/// The timeout sits outside the in-flight bound so that time spent waiting
/// for a slot counts against `timeouts.request_secs`.
#[allow(deprecated)]
fn with_middleware(router: Router, config: &GateConfig) -> Router {
    let slots = config.listener.max_in_flight.min(Semaphore::MAX_PERMITS);
    let in_flight = Arc::new(Semaphore::new(slots));

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(middleware::from_fn_with_state(in_flight, limit_in_flight)),
    )
}

/// Hold one in-flight slot for the lifetime of the request.
async fn limit_in_flight(
    State(slots): State<Arc<Semaphore>>,
    request: Request,
    next: Next,
) -> Response {
    let Ok(_slot) = slots.acquire().await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    next.run(request).await
}

/// Admission handler: one decision per GET.
async fn admit_handler(
    method: Method,
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    // `get` routes also answer HEAD; only GET is counted.
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET")]).into_response();
    }

    let started = Instant::now();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let client_id = match extract_client_id(query.as_deref(), &state.client_id_param) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(request_id = %request_id, reason = %e, "Malformed client id");
            metrics::record_malformed_request();
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let (count, decision) = state.controller.admit(client_id);
    metrics::record_decision(decision, started);

    match decision {
        Decision::Admit => {
            tracing::debug!(request_id = %request_id, client_id, count, "Admitted");
        }
        Decision::Reject => {
            tracing::warn!(
                request_id = %request_id,
                client_id,
                count,
                quota = state.controller.policy().quota,
                "Quota exceeded"
            );
        }
    }

    decision.into_response()
}
