pub mod api;
pub mod bootstrap;
pub mod config;
pub mod conversation;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod server;
pub mod wallet;
