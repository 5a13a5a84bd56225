use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::models::{AppState, CurrentUser};
use crate::services::authenticate;
use crate::templates::{IndexTemplate, LoginTemplate};
use crate::utils::safe_next_path;

use super::helpers::{
    build_template_globals, current_username_from_jar, render_template, render_with_status, session_id_from_jar,
    TemplateGlobals, SESSION_COOKIE,
};

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

pub async fn login_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next_path(query.next.as_deref());
    if current_username_from_jar(&state, &jar).is_some() {
        return Redirect::to(&next).into_response();
    }
    login_page(&state, &jar, StatusCode::OK, None, next)
}

pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next_path(form.next.as_deref());
    match authenticate(state.credentials.as_ref(), &form.username, &form.password) {
        Ok(Some(user)) => {
            let sid = state.start_session(&user.username);
            tracing::info!(username = %user.username, "User logged in");
            let cookie = Cookie::build((SESSION_COOKIE, sid))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::hours(state.session_ttl_hours));
            (jar.add(cookie), Redirect::to(&next)).into_response()
        }
        Ok(None) => {
            tracing::warn!(username = %form.username.trim(), "Failed login attempt");
            login_page(
                &state,
                &jar,
                StatusCode::UNAUTHORIZED,
                Some("Invalid username or password".into()),
                next,
            )
        }
        Err(e) => {
            tracing::error!(%e, "Credential directory unavailable during login");
            login_page(
                &state,
                &jar,
                StatusCode::SERVICE_UNAVAILABLE,
                Some("Sign-in is temporarily unavailable".into()),
                next,
            )
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(sid) = session_id_from_jar(&jar) {
        state.end_session(&sid);
    }
    let cleared = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    (cleared, Redirect::to("/login"))
}

pub async fn home_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(&state, &jar, Some(user));
    render_template(IndexTemplate {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    })
}

fn login_page(
    state: &AppState,
    jar: &CookieJar,
    status: StatusCode,
    error: Option<String>,
    next: String,
) -> Response {
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(state, jar, None);
    render_with_status(
        status,
        LoginTemplate {
            current_user,
            app_name,
            flash_messages,
            has_flash_messages,
            servers,
            error,
            next,
        },
    )
}
