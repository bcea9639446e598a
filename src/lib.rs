pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod platform;
pub mod review;
pub mod server;
pub mod service;
pub mod shutdown;
