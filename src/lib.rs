pub mod catalog;
pub mod config;
pub mod content;
pub mod membership;
pub mod server;
pub mod server_store;
pub mod sqlite_persistence;
pub mod user;
