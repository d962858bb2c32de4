// Library interface for orbit (shared by the binary and the integration tests)
pub mod api;
pub mod app;
pub mod auth;
pub mod comments;
pub mod config;
pub mod crop;
pub mod detail;
pub mod feed;

#[macro_use]
pub mod logging;

pub mod profile;
pub mod server_config;
pub mod session;
pub mod storage;
pub mod terminal;
pub mod text_wrapper;
pub mod ui;
pub mod upload;
