pub mod client;
pub mod config;
pub mod engagement;
pub mod error;
pub mod history;
pub mod languages;
pub mod server;
pub mod session;
pub mod settings;
pub mod speech;
pub mod store;
