pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod content;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod learning;
pub mod session;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod validation;
