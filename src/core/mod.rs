pub mod config;
pub mod history;
pub mod message;
pub mod models;
pub mod request;
pub mod reveal;
pub mod session;
pub mod store;
pub mod tokens;
pub mod turn_service;
