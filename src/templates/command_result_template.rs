use std::sync::Arc;

use askama::Template;

use crate::models::{CurrentUser, ServerDescriptor};
use crate::templates::BaseTemplate;
use crate::utils::ResultSection;

#[derive(Debug, Clone)]
pub struct PageLink {
    pub href: String,
    pub label: String,
}

/// Generic page for a successful command: status, check, show-server,
/// show-backup, delete and backup all share it.
#[derive(Template)]
#[template(path = "command_result.html")]
pub struct CommandResultTemplate {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
    pub heading: String,
    pub sections: Vec<ResultSection>,
    pub notices: Vec<String>,
    pub links: Vec<PageLink>,
}

crate::impl_base_template!(CommandResultTemplate);
