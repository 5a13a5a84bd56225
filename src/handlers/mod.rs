pub mod auth;
pub mod barman;
pub mod helpers;
pub mod middleware;
