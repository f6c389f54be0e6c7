pub mod cli;
pub mod common;
pub mod configuration;
pub mod core;
pub mod fetch;
pub mod logger;
pub mod session;
