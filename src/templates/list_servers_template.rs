use std::sync::Arc;

use askama::Template;

use crate::models::{CurrentUser, ServerDescriptor};
use crate::templates::BaseTemplate;

#[derive(Template)]
#[template(path = "list_servers.html")]
pub struct ListServersTemplate {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
    /// Live result of `list-server`, which may differ from the cached menu
    pub rows: Vec<ServerDescriptor>,
    pub notices: Vec<String>,
}

crate::impl_base_template!(ListServersTemplate);
