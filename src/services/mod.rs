pub mod credential_store;
pub mod registry_service;
pub mod user_service;

// Re-export commonly used items
pub use credential_store::{CredentialDirectory, JsonCredentialStore, StoreError};
pub use registry_service::{servers_from_payload, RegistryError, ServerRegistry};
pub use user_service::{authenticate, ensure_admin_account, generate_password_hash, random_session_id, verify_password};
