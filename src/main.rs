use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use learnpath_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::cors::permissive_cors,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Sweep ungraded assessments past their TTL; graded ones are durable.
    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state.assessment_service.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, "expired assessment sessions swept"),
                    Err(e) => tracing::error!(error = ?e, "assessment sweeper error"),
                }
                tokio::time::sleep(Duration::from_secs(600)).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let auth_api = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .layer(axum::middleware::from_fn_with_state(
            learnpath_backend::middleware::rate_limit::new_rps_state("auth", config.auth_rps),
            learnpath_backend::middleware::rate_limit::rps_middleware,
        ));

    let learn_api = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/learn/assessments",
            post(routes::assessment::start_assessment),
        )
        .route(
            "/api/learn/assessments/:id/submit",
            post(routes::assessment::submit_assessment),
        )
        .route("/api/courses", get(routes::course::list_courses))
        .route(
            "/api/courses/:id",
            get(routes::course::get_course).delete(routes::course::delete_course),
        )
        .route(
            "/api/courses/:id/modules/:module_id",
            get(routes::course::select_module),
        )
        .route(
            "/api/courses/:id/modules/:module_id/complete",
            post(routes::course::complete_module),
        )
        .route(
            "/api/courses/:id/modules/:module_id/content",
            post(routes::tutor::module_content),
        )
        .route(
            "/api/courses/:id/modules/:module_id/tutor",
            post(routes::tutor::ask_tutor),
        )
        .layer(axum::middleware::from_fn(
            learnpath_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            learnpath_backend::middleware::rate_limit::new_rps_state("api", config.api_rps),
            learnpath_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(auth_api)
        .merge(learn_api)
        .with_state(app_state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
