//! Session layer: keeps one conversation per session id and exposes the
//! chat over HTTP.

pub mod routes;
pub mod store;

pub use routes::{AppState, ChatRequest, ChatResponse, feature_routes};
pub use store::{DEFAULT_SESSION, SessionStatus, SessionStore, spawn_sweep_task};
