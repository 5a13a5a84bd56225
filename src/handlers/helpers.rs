use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::models::{AppState, CurrentUser, ServerDescriptor};
use crate::templates::ErrorTemplate;

pub const SESSION_COOKIE: &str = "session_id";

pub fn session_id_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

pub fn current_username_from_jar(state: &AppState, jar: &CookieJar) -> Option<String> {
    let sid = session_id_from_jar(jar)?;
    state.session_user(&sid)
}

pub fn take_flash_messages(state: &AppState, jar: &CookieJar) -> Vec<String> {
    match session_id_from_jar(jar) {
        Some(sid) => state.flash_store.lock().remove(&sid).unwrap_or_default(),
        None => vec![],
    }
}

pub fn push_flash(state: &AppState, jar: &CookieJar, message: impl Into<String>) {
    if let Some(sid) = session_id_from_jar(jar) {
        state.push_flash(&sid, message);
    }
}

/// Fields every page shares: who is logged in, pending flashes and the
/// cached server list for the navigation menu.
pub struct TemplateGlobals {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
}

pub fn build_template_globals(
    state: &AppState,
    jar: &CookieJar,
    current_user: Option<CurrentUser>,
) -> TemplateGlobals {
    let flash_messages = take_flash_messages(state, jar);
    let has_flash_messages = !flash_messages.is_empty();
    // Anonymous pages do not get to see the server list.
    let servers = if current_user.is_some() {
        state.registry.current()
    } else {
        Arc::new(Vec::new())
    };
    TemplateGlobals {
        current_user,
        app_name: state.app_name.clone(),
        flash_messages,
        has_flash_messages,
        servers,
    }
}

pub fn render_template<T: askama::Template>(t: T) -> Response {
    render_with_status(StatusCode::OK, t)
}

pub fn render_with_status<T: askama::Template>(status: StatusCode, t: T) -> Response {
    match t.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(%e, "Template render error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

pub fn error_page(
    state: &AppState,
    jar: &CookieJar,
    user: Option<CurrentUser>,
    status: StatusCode,
    title: &str,
    messages: Vec<String>,
    detail: Option<String>,
) -> Response {
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(state, jar, user);
    render_with_status(
        status,
        ErrorTemplate {
            current_user,
            app_name,
            flash_messages,
            has_flash_messages,
            servers,
            title: title.to_string(),
            messages,
            detail,
        },
    )
}
