//! Client side of the CRM workspace.
//!
//! Talks to `crm-server` over HTTP, keeps the caller's opportunity list in
//! memory and merges the realtime change feed into it. The table, kanban and
//! export views all read from [`store::OpportunityStore`].

pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod kanban;
pub mod routes;
pub mod session;
pub mod store;

pub use backend::{Backend, ChangeStream, Scope};
pub use config::ClientConfig;
pub use error::{BackendError, ClientError};
pub use http::HttpBackend;
pub use session::Session;
pub use store::{OpportunityStore, RealtimeHandle, SharedStore, spawn_realtime};
