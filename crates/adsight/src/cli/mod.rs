//! Terminal presentation layer: thin client over the agent server

pub mod client;
pub mod commands;
pub mod display;
pub mod server_manager;
