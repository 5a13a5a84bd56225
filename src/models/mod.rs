pub mod app_state;
pub mod current_user;
pub mod server_descriptor;
pub mod user_record;

pub use app_state::{AppState, Session};
pub use current_user::CurrentUser;
pub use server_descriptor::ServerDescriptor;
pub use user_record::{RoleRecord, UserRecord, UserRoleRecord};
