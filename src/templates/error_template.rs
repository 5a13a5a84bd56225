use std::sync::Arc;

use askama::Template;

use crate::models::{CurrentUser, ServerDescriptor};
use crate::templates::BaseTemplate;

/// Shared by gateway failures, tool-reported errors, denials and 404s.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
    pub title: String,
    pub messages: Vec<String>,
    pub detail: Option<String>,
}

crate::impl_base_template!(ErrorTemplate);
