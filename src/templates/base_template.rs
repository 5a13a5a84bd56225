use crate::config::SUPER_ADMIN_ROLE;
use crate::models::{CurrentUser, ServerDescriptor};

/// Base template trait providing common properties for all templates.
pub trait BaseTemplate {
    fn current_user(&self) -> &Option<CurrentUser>;
    fn app_name(&self) -> &str;
    fn flash_messages(&self) -> &Vec<String>;
    fn has_flash_messages(&self) -> bool;
    fn servers(&self) -> &[ServerDescriptor];

    /// Whether the navigation should offer the administrative links.
    fn is_admin(&self) -> bool {
        self.current_user()
            .as_ref()
            .map(|u| u.has_role(SUPER_ADMIN_ROLE))
            .unwrap_or(false)
    }
}

/// Macro to implement BaseTemplate for a struct with standard fields
#[macro_export]
macro_rules! impl_base_template {
    ($struct_name:ty) => {
        impl $crate::templates::BaseTemplate for $struct_name {
            fn current_user(&self) -> &Option<$crate::models::CurrentUser> {
                &self.current_user
            }
            fn app_name(&self) -> &str {
                &self.app_name
            }
            fn flash_messages(&self) -> &Vec<String> {
                &self.flash_messages
            }
            fn has_flash_messages(&self) -> bool {
                self.has_flash_messages
            }
            fn servers(&self) -> &[$crate::models::ServerDescriptor] {
                &self.servers
            }
        }
    };
}
