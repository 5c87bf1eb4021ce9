pub mod api;
pub mod cli;
pub mod config;
pub mod cookies;
pub mod engine;
pub mod humanize;
pub mod manager;
pub mod observability;
pub mod server;
pub mod store;
