//! HTTP API for the invoice dashboard: configuration, routing, and
//! request/response mapping over the analytics engine.

pub mod app;
pub mod config;
pub mod middleware;
