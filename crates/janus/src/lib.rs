pub mod admin;
pub mod app_state;
pub mod apps;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod provision;
pub mod server;
pub mod sessions;
pub mod store;
pub mod users;
pub mod verifier;
