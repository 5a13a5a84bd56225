//! Pages backed by one barman verb each.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;

use crate::gateway::{tool_errors, tool_notices, verbs, GatewayError};
use crate::models::{AppState, CurrentUser};
use crate::services::servers_from_payload;
use crate::templates::{
    BackupRow, CommandResultTemplate, ListBackupsTemplate, ListServersTemplate, PageLink,
    PreLaunchBackupTemplate,
};
use crate::utils::{sections_from_value, value_to_short_string};

use super::helpers::{build_template_globals, error_page, push_flash, render_template, TemplateGlobals};

/// Classified outcome of one gateway call.
#[derive(Debug)]
pub enum CommandView {
    /// Decoded output, forwarded unchanged
    Success(Value),
    /// The tool answered but reported errors (unknown server, bad backup id...)
    ToolError(Vec<String>),
    /// Nothing usable came back
    Failed(GatewayError),
}

impl CommandView {
    pub fn from_result(result: Result<Value, GatewayError>) -> Self {
        match result {
            Ok(payload) => {
                let errors = tool_errors(&payload);
                if errors.is_empty() {
                    CommandView::Success(payload)
                } else {
                    CommandView::ToolError(errors)
                }
            }
            Err(e) => CommandView::Failed(e),
        }
    }
}

pub async fn run_command(state: &AppState, verb: &str, args: Vec<String>) -> CommandView {
    let view = CommandView::from_result(state.gateway.execute(verb, &args).await);
    match &view {
        CommandView::Success(_) => tracing::info!(verb, ?args, "barman command succeeded"),
        CommandView::ToolError(errors) => tracing::warn!(verb, ?args, ?errors, "barman reported errors"),
        CommandView::Failed(e) => tracing::error!(verb, ?args, kind = e.kind(), %e, "barman command failed"),
    }
    view
}

fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn link(href: String, label: &str) -> PageLink {
    PageLink {
        href,
        label: label.to_string(),
    }
}

fn server_links(server: &str) -> Vec<PageLink> {
    let s = path_segment(server);
    vec![
        link(format!("/statusserver/{}", s), "Status"),
        link(format!("/checkserver/{}", s), "Check"),
        link(format!("/showserver/{}", s), "Configuration"),
        link(format!("/listbackupsserver/{}", s), "Backups"),
    ]
}

/// Renders the non-success outcomes. Returns `Err(payload)` on success so the
/// caller can build its own page.
fn failure_page(state: &AppState, jar: &CookieJar, user: CurrentUser, view: CommandView) -> Result<Response, Value> {
    let (status, title, messages, detail) = match view {
        CommandView::Success(payload) => return Err(payload),
        CommandView::ToolError(errors) => (
            StatusCode::NOT_FOUND,
            "barman rejected the request",
            errors,
            None,
        ),
        CommandView::Failed(e) => {
            let detail = match &e {
                GatewayError::Decode { stderr, .. } if !stderr.is_empty() => Some(stderr.clone()),
                _ => None,
            };
            (
                StatusCode::BAD_GATEWAY,
                "barman could not be run",
                vec![e.to_string()],
                detail,
            )
        }
    };
    Ok(error_page(state, jar, Some(user), status, title, messages, detail))
}

fn result_page(
    state: &AppState,
    jar: &CookieJar,
    user: CurrentUser,
    heading: String,
    view: CommandView,
    links: Vec<PageLink>,
) -> Response {
    let payload = match failure_page(state, jar, user.clone(), view) {
        Ok(response) => return response,
        Err(payload) => payload,
    };
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(state, jar, Some(user));
    render_template(CommandResultTemplate {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
        heading,
        sections: sections_from_value(&payload),
        notices: tool_notices(&payload),
        links,
    })
}

pub async fn refresh_list(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.registry.refresh().await {
        Ok(count) => push_flash(&state, &jar, format!("Server list refreshed ({} servers).", count)),
        Err(e) => {
            tracing::error!(%e, "Server list refresh failed");
            push_flash(&state, &jar, format!("Could not refresh the server list: {}", e));
        }
    }
    Redirect::to("/").into_response()
}

pub async fn list_servers(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let view = run_command(&state, verbs::LIST_SERVER, vec![]).await;
    let payload = match failure_page(&state, &jar, user.clone(), view) {
        Ok(response) => return response,
        Err(payload) => payload,
    };
    let rows = match servers_from_payload(&payload) {
        Ok(rows) => rows,
        Err(e) => {
            return error_page(
                &state,
                &jar,
                Some(user),
                StatusCode::BAD_GATEWAY,
                "barman returned an unexpected server list",
                vec![e.to_string()],
                None,
            )
        }
    };
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(&state, &jar, Some(user));
    render_template(ListServersTemplate {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
        rows,
        notices: tool_notices(&payload),
    })
}

pub async fn status_server(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path(server): Path<String>,
) -> Response {
    let view = run_command(&state, verbs::STATUS, vec![server.clone()]).await;
    let links = server_links(&server);
    result_page(&state, &jar, user, format!("Status of {}", server), view, links)
}

pub async fn check_server(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path(server): Path<String>,
) -> Response {
    let view = run_command(&state, verbs::CHECK, vec![server.clone()]).await;
    let links = server_links(&server);
    result_page(&state, &jar, user, format!("Check of {}", server), view, links)
}

pub async fn show_server(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path(server): Path<String>,
) -> Response {
    let view = run_command(&state, verbs::SHOW_SERVER, vec![server.clone()]).await;
    let links = server_links(&server);
    result_page(&state, &jar, user, format!("Configuration of {}", server), view, links)
}

pub async fn list_backups(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path(server): Path<String>,
) -> Response {
    let view = run_command(&state, verbs::LIST_BACKUP, vec![server.clone()]).await;
    let payload = match failure_page(&state, &jar, user.clone(), view) {
        Ok(response) => return response,
        Err(payload) => payload,
    };
    let today = chrono::Local::now().format("%Y%m%d").to_string();
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(&state, &jar, Some(user));
    render_template(ListBackupsTemplate {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
        server_path: path_segment(&server),
        server,
        backups: backups_from_payload(&payload, &today),
        today,
        notices: tool_notices(&payload),
    })
}

pub async fn show_backup(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path((server, backup_id)): Path<(String, String)>,
) -> Response {
    let view = run_command(&state, verbs::SHOW_BACKUP, vec![server.clone(), backup_id.clone()]).await;
    let links = vec![link(
        format!("/listbackupsserver/{}", path_segment(&server)),
        "Back to backups",
    )];
    result_page(
        &state,
        &jar,
        user,
        format!("Backup {} of {}", backup_id, server),
        view,
        links,
    )
}

pub async fn delete_backup(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path((server, backup_id)): Path<(String, String)>,
) -> Response {
    tracing::info!(username = %user.username, server = %server, backup_id = %backup_id, "Deleting backup");
    let view = run_command(&state, verbs::DELETE, vec![server.clone(), backup_id.clone()]).await;
    let links = vec![link(
        format!("/listbackupsserver/{}", path_segment(&server)),
        "Back to backups",
    )];
    result_page(
        &state,
        &jar,
        user,
        format!("Deletion of backup {} of {}", backup_id, server),
        view,
        links,
    )
}

pub async fn prelaunch_backup(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path(server): Path<String>,
) -> Response {
    let TemplateGlobals {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
    } = build_template_globals(&state, &jar, Some(user));
    render_template(PreLaunchBackupTemplate {
        current_user,
        app_name,
        flash_messages,
        has_flash_messages,
        servers,
        server_path: path_segment(&server),
        server,
    })
}

pub async fn launch_backup(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Path(server): Path<String>,
) -> Response {
    tracing::info!(username = %user.username, server = %server, "Starting backup");
    let view = run_command(&state, verbs::BACKUP, vec![server.clone()]).await;
    let links = vec![link(
        format!("/listbackupsserver/{}", path_segment(&server)),
        "Back to backups",
    )];
    result_page(&state, &jar, user, format!("Backup of {}", server), view, links)
}

/// Rows for the backups table. Accepts `{"server": [..]}` as barman prints it,
/// or a bare array.
pub fn backups_from_payload(payload: &Value, today: &str) -> Vec<BackupRow> {
    let entries: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .filter_map(|(_, v)| v.as_array())
            .flatten()
            .collect(),
        _ => vec![],
    };

    let text = |entry: &Value, key: &str| entry.get(key).map(value_to_short_string).unwrap_or_default();
    entries
        .into_iter()
        .filter(|e| e.is_object())
        .map(|entry| {
            let backup_id = text(entry, "backup_id");
            let size = match text(entry, "size") {
                s if s.is_empty() => text(entry, "size_bytes"),
                s => s,
            };
            BackupRow {
                is_today: !today.is_empty() && backup_id.starts_with(today),
                backup_id,
                end_time: text(entry, "end_time"),
                status: text(entry, "status"),
                retention_status: text(entry, "retention_status"),
                size,
                wal_size: text(entry, "wal_size"),
            }
        })
        .collect()
}
