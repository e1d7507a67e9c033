//! CRM server: REST surface over Postgres plus a server-sent change feed.

pub mod admin;
pub mod auth;
pub mod config;
pub mod convert;
pub mod http;
pub mod opportunities;
pub mod realtime;
pub mod seed;
pub mod service;

pub use config::AppConfig;
pub use http::{AppState, ServeConfig, build_router, serve};
pub use realtime::ChangeHub;
