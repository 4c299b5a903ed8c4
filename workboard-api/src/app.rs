/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use workboard_api::{app::AppState, config::Config};
/// use workboard_shared::db::pool::create_pool;
/// use workboard_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = workboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use workboard_shared::auth::middleware::{extract_bearer, AuthContext};
use workboard_shared::services::{
    projects::ProjectService, session::SessionService, tasks::TaskService,
};
use workboard_shared::store::WorkStore;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub session: SessionService,

    /// Store handle, used directly only by the health check
    pub store: Arc<dyn WorkStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every service to one store
    pub fn new(store: Arc<dyn WorkStore>, config: Config) -> Self {
        Self {
            projects: ProjectService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            session: SessionService::new(store.clone(), config.token_config()),
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// └── /v1/
///     ├── /auth/                      # Public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /projects/                  # Bearer token
///     │   ├── GET, POST /
///     │   ├── GET, PUT, DELETE /:project_id
///     │   ├── PUT  /:project_id/favorite
///     │   ├── PUT  /:project_id/owner
///     │   ├── POST /:project_id/members
///     │   ├── PUT, DELETE /:project_id/members/:user_id
///     │   ├── GET  /:project_id/tasks
///     │   └── GET  /:project_id/activities
///     └── /tasks/                     # Bearer token
///         ├── GET, POST /
///         ├── GET, PUT, DELETE /:task_id
///         └── POST /:task_id/assign
/// ```
///
/// # Middleware Stack
///
/// Applied in order (innermost first):
/// 1. Authentication (protected routes only)
/// 2. Logging (tower-http TraceLayer)
/// 3. Compression
/// 4. CORS
/// 5. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:project_id/favorite", put(routes::projects::set_favorite))
        .route("/:project_id/owner", put(routes::projects::change_owner))
        .route("/:project_id/members", post(routes::projects::add_member))
        .route(
            "/:project_id/members/:user_id",
            put(routes::projects::update_member_role).delete(routes::projects::remove_member),
        )
        .route("/:project_id/tasks", get(routes::tasks::list_project_tasks))
        .route("/:project_id/activities", get(routes::projects::list_activities))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:task_id/assign", post(routes::tasks::assign_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes);

    let cors = cors_layer(&state.config.api.cors_origins);
    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Permissive when the origin list contains `*`, otherwise an explicit allow list
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the Bearer access token and injects [`AuthContext`] into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let user_id = state.session.verify_access(token)?;

    req.extensions_mut().insert(AuthContext::new(user_id));

    Ok(next.run(req).await)
}
