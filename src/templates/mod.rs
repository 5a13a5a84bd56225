// Base template trait for inheritance
pub mod base_template;
pub use base_template::BaseTemplate;

// Individual template files
pub mod command_result_template;
pub mod error_template;
pub mod index_template;
pub mod list_backups_template;
pub mod list_servers_template;
pub mod login_template;
pub mod pre_launch_backup_template;

// Re-export all templates
pub use command_result_template::{CommandResultTemplate, PageLink};
pub use error_template::ErrorTemplate;
pub use index_template::IndexTemplate;
pub use list_backups_template::{BackupRow, ListBackupsTemplate};
pub use list_servers_template::ListServersTemplate;
pub use login_template::LoginTemplate;
pub use pre_launch_backup_template::PreLaunchBackupTemplate;
