use std::sync::Arc;

use askama::Template;

use crate::models::{CurrentUser, ServerDescriptor};
use crate::templates::BaseTemplate;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
}

crate::impl_base_template!(IndexTemplate);
