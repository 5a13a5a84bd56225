use std::sync::Arc;

use askama::Template;

use crate::models::{CurrentUser, ServerDescriptor};
use crate::templates::BaseTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRow {
    pub backup_id: String,
    pub end_time: String,
    pub status: String,
    pub retention_status: String,
    pub size: String,
    pub wal_size: String,
    /// Backup id starts with today's date
    pub is_today: bool,
}

impl BackupRow {
    pub fn path_id(&self) -> String {
        urlencoding::encode(&self.backup_id).into_owned()
    }
}

#[derive(Template)]
#[template(path = "list_backups.html")]
pub struct ListBackupsTemplate {
    pub current_user: Option<CurrentUser>,
    pub app_name: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub servers: Arc<Vec<ServerDescriptor>>,
    pub server: String,
    pub server_path: String,
    pub backups: Vec<BackupRow>,
    pub today: String,
    pub notices: Vec<String>,
}

crate::impl_base_template!(ListBackupsTemplate);
