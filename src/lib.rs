//! Web dashboard over the barman backup tool.
//!
//! Requests pass an authentication gate and, for every barman page, a
//! SuperAdmin role gate before a handler runs one `barman -f json` command
//! through the [`gateway`] and renders the decoded document.

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod templates;
pub mod utils;

pub use models::AppState;
pub use routes::build_router;
