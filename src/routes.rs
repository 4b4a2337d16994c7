use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{admin, protected, public};
use crate::middleware::{require_admin, require_authenticated};
use crate::state::AppState;

/// Full application router: public, session-gated and admin-gated tiers
pub fn app(state: AppState) -> Router {
    let api = &state.config.api;

    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(&state))
        .merge(admin_routes(&state))
        .fallback(public::fallback)
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }
    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::homepage_view))
        .route("/health", get(public::health))
        // Login flow
        .route("/login", get(public::login))
        .route("/callback", get(public::callback))
        .route("/logout", get(public::logout))
        // Error pages
        .route("/401", get(public::unauthorized_page))
        .route("/403", get(public::forbidden_page))
        .route("/404", get(public::not_found_page))
        .route("/500", get(public::server_error_page))
        // Browser configuration
        .route("/auth/config.js", get(public::config_js))
        .route("/api/config", get(public::api_config))
        // Public content
        .route("/api/homepage", get(public::homepage_json))
        .route("/api/taxonomy/flatten", get(public::flatten_all))
        .route("/media/:bucket/*key", get(public::media))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(protected::dashboard))
        // Profile
        .route(
            "/api/profile",
            get(protected::profile_get)
                .post(protected::profile_create)
                .put(protected::profile_update),
        )
        .route("/api/profile/preferences", post(protected::preferences_save))
        // Taxonomy
        .route("/api/taxonomy", get(protected::taxonomy_list))
        .route("/api/taxonomy/:id/children", get(protected::taxonomy_children))
        .route(
            "/api/taxonomy/:id/children/recursive",
            get(protected::taxonomy_children_recursive),
        )
        // Video
        .route("/api/video", get(protected::video_list))
        .route("/api/video/:id", get(protected::video_get))
        .route("/api/video/taxonomy/:id", get(protected::video_by_taxonomy))
        .route("/api/video/grade/:name", get(protected::video_by_grade))
        // Students and billing
        .route("/api/student", get(protected::student_list).post(protected::student_add))
        .route("/api/student/:id", put(protected::student_update))
        .route("/api/billing", get(protected::billing_get).post(protected::billing_save))
        .route_layer(from_fn_with_state(state.clone(), require_authenticated))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    let max_upload = state.config.api.max_upload_size_bytes;

    Router::new()
        .route("/admin/dashboard", get(admin::admin_dashboard))
        .route("/admin/taxonomy", get(admin::taxonomy_view))
        // Taxonomy management
        .route("/api/taxonomy", post(admin::taxonomy_add))
        .route("/api/taxonomy/:id", put(admin::taxonomy_update))
        // Video management
        .route("/api/video", post(admin::video_add))
        .route("/api/video/:id", put(admin::video_update).delete(admin::video_delete))
        .route(
            "/api/video/:id/upload",
            post(admin::video_upload).layer(DefaultBodyLimit::max(max_upload)),
        )
        // Homepage content
        .route("/api/homepage", post(admin::homepage_save))
        // Reports
        .route("/api/admin/users", get(admin::report_users))
        .route("/api/admin/students", get(admin::report_students))
        .route("/api/admin/payments", get(admin::report_payments))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
