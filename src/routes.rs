use axum::{
    http::{header::CONTENT_TYPE, HeaderValue},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use axum::http::header::CACHE_CONTROL;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::SUPER_ADMIN_ROLE;
use crate::handlers::{self, middleware::RequiredRole};
use crate::models::AppState;

// Embed the default stylesheet in the binary
const DEFAULT_STYLESHEET: &str = include_str!("../static/styles.css");

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/refreshlist", get(handlers::barman::refresh_list))
        .route("/listservers", get(handlers::barman::list_servers))
        .route("/statusserver/:server", get(handlers::barman::status_server))
        .route("/checkserver/:server", get(handlers::barman::check_server))
        .route("/listbackupsserver/:server", get(handlers::barman::list_backups))
        .route("/showserver/:server", get(handlers::barman::show_server))
        .route("/showbackup/:server/:backupid", get(handlers::barman::show_backup))
        .route("/deletebackup/:server/:backupid", get(handlers::barman::delete_backup))
        .route("/prelaunchbackup/:server", get(handlers::barman::prelaunch_backup))
        .route("/launchbackup/:server", get(handlers::barman::launch_backup))
        .route_layer(from_fn_with_state(
            (state.clone(), RequiredRole(SUPER_ADMIN_ROLE)),
            handlers::middleware::require_role,
        ));

    let member_routes = Router::new()
        .route("/", get(handlers::auth::home_page))
        .route_layer(from_fn_with_state(state.clone(), handlers::middleware::require_login));

    let stylesheet = Router::new()
        .route(
            "/static/styles.css",
            get(|| async { ([(CONTENT_TYPE, "text/css")], DEFAULT_STYLESHEET) }),
        )
        .layer(ServiceBuilder::new().layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        )));

    Router::new()
        .route("/login", get(handlers::auth::login_get).post(handlers::auth::login_post))
        .route("/logout", get(handlers::auth::logout).post(handlers::auth::logout))
        .merge(stylesheet)
        .merge(member_routes)
        .merge(admin_routes)
        .fallback(handlers::middleware::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
