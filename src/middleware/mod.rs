pub mod auth;
pub mod watcher;
