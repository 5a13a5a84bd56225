use std::sync::Arc;

use askama::Template;

use crate::models::{CurrentUser, ServerDescriptor};
use crate::templates::BaseTemplate;

#[derive(Template)]
#[template(path = "pre_launch_backup.html")]
pub struct PreLaunchBackupTemplate {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
    pub server: String,
    pub server_path: String,
}

crate::impl_base_template!(PreLaunchBackupTemplate);
