//! Authentication and role gates applied in front of route handlers.

use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::config::SUPER_ADMIN_ROLE;
use crate::handlers::helpers::{current_username_from_jar, error_page};
use crate::models::{AppState, CurrentUser};
use crate::services::CredentialDirectory;
use crate::utils::login_url_for;

/// Role a route group demands, fixed when the routes are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredRole(pub &'static str);

#[derive(Debug, Clone)]
pub enum Access {
    Granted(CurrentUser),
    LoginRequired,
    Denied,
}

/// Runs both gates for one request. `username` is whatever the session
/// cookie resolved to; `required_role` is `None` for login-only routes.
pub fn evaluate(
    username: Option<&str>,
    directory: &dyn CredentialDirectory,
    required_role: Option<&str>,
) -> Access {
    let Some(username) = username else {
        return Access::LoginRequired;
    };
    let record = match directory.find_by_username(username) {
        Ok(Some(record)) if record.active => record,
        Ok(_) => return Access::LoginRequired,
        Err(e) => {
            tracing::error!(%e, username, "Credential lookup failed");
            return Access::Denied;
        }
    };
    let roles: Vec<String> = match directory.roles_of(record.id) {
        Ok(roles) => roles.into_iter().map(|r| r.name).collect(),
        Err(e) => {
            tracing::error!(%e, username, "Role lookup failed");
            return Access::Denied;
        }
    };
    let user = CurrentUser {
        username: record.username,
        roles,
    };
    match required_role {
        Some(role) if !user.has_role(role) => Access::Denied,
        _ => Access::Granted(user),
    }
}

/// Gate 1 only.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    gate(&state, &jar, None, request, next).await
}

/// Gates 1 and 2, with the role supplied alongside the state.
pub async fn require_role(
    State((state, role)): State<(AppState, RequiredRole)>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    gate(&state, &jar, Some(role.0), request, next).await
}

async fn gate(
    state: &AppState,
    jar: &CookieJar,
    required_role: Option<&str>,
    mut request: Request,
    next: Next,
) -> Response {
    let username = current_username_from_jar(state, jar);
    match evaluate(username.as_deref(), state.credentials.as_ref(), required_role) {
        Access::Granted(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Access::LoginRequired => {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            tracing::debug!(path = target, "Anonymous request redirected to login");
            Redirect::to(&login_url_for(target)).into_response()
        }
        Access::Denied => {
            tracing::warn!(
                username = username.as_deref().unwrap_or(""),
                role = required_role.unwrap_or(""),
                "Access denied"
            );
            denied_response(state, jar, None)
        }
    }
}

/// 403 page. It names neither the route nor the missing role.
pub fn denied_response(state: &AppState, jar: &CookieJar, current_user: Option<CurrentUser>) -> Response {
    error_page(
        state,
        jar,
        current_user,
        StatusCode::FORBIDDEN,
        "Access denied",
        vec!["Your account is not allowed to perform this action.".into()],
        None,
    )
}

/// Unknown paths go through the administrative gates first, so only a
/// SuperAdmin can tell a missing page from a forbidden one.
pub async fn not_found(State(state): State<AppState>, jar: CookieJar, uri: Uri) -> Response {
    let username = current_username_from_jar(&state, &jar);
    match evaluate(username.as_deref(), state.credentials.as_ref(), Some(SUPER_ADMIN_ROLE)) {
        Access::LoginRequired => {
            let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
            Redirect::to(&login_url_for(target)).into_response()
        }
        Access::Denied => denied_response(&state, &jar, None),
        Access::Granted(user) => error_page(
            &state,
            &jar,
            Some(user),
            StatusCode::NOT_FOUND,
            "Page not found",
            vec![format!("Nothing is served at {}.", uri.path())],
            None,
        ),
    }
}
