use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryContacts, InMemoryDirectory, InMemoryScheduling};
use crate::routes::with_service_routes;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use volunteer_desk::backend::RestBackend;
use volunteer_desk::config::{AppConfig, MatchingSettings};
use volunteer_desk::error::AppError;
use volunteer_desk::telemetry;
use volunteer_desk::workflows::matching::{
    ContactPublisher, MatchingService, ScoringConfig, VolunteerDirectory,
};
use volunteer_desk::workflows::scheduling::{AssignmentService, SchedulingRepository};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let settings = config.matching;
    let app = match config.backend.base_url.as_deref() {
        Some(base_url) => {
            info!(%base_url, "using study backend");
            let backend = Arc::new(RestBackend::new(&config.backend)?);
            build_app(backend.clone(), backend.clone(), backend, settings)
        }
        None => {
            warn!("BACKEND_BASE_URL not set; serving seeded in-memory data");
            build_app(
                Arc::new(InMemoryDirectory::seeded()),
                Arc::new(InMemoryContacts::default()),
                Arc::new(InMemoryScheduling::seeded()),
                settings,
            )
        }
    }
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "volunteer desk ready");

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_app<D, C, R>(
    directory: Arc<D>,
    contacts: Arc<C>,
    repository: Arc<R>,
    settings: MatchingSettings,
) -> Router
where
    D: VolunteerDirectory + 'static,
    C: ContactPublisher + 'static,
    R: SchedulingRepository + 'static,
{
    let matching = Arc::new(MatchingService::new(
        directory.clone(),
        contacts,
        settings,
        ScoringConfig::default(),
    ));
    let scheduling = Arc::new(AssignmentService::new(repository, directory));
    with_service_routes(matching, scheduling)
}
