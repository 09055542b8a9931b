//! REST API module for the adsight agent
//!
//! Exposes the agent pipeline and the evaluation metrics over HTTP with axum.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod services;
pub mod startup;
pub mod types;
