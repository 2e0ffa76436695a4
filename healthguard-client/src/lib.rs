//! HealthGuard client - session-gated views over the HealthGuard backend
//!
//! Layers, leaves first:
//! - `session` : token + username persistence (file, keyring or memory)
//! - `routes` : route table and the session guard in front of every view
//! - `api` : typed HTTP gateway, one function per backend capability
//! - `controllers` : form submission and view logic (login, assessment, ...)
//! - `monitor` : polling loop of the real-time vitals view
//! - `notify` : user-facing notices

pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod routes;
pub mod session;
pub mod state;

pub use api::ApiGateway;
pub use config::ClientConfig;
pub use controllers::AppContext;
pub use error::{ClientError, Result};
pub use monitor::{LiveMonitor, MonitorSnapshot, MonitorState, VitalsSource};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use routes::{Layout, Navigation, Route, RouteGuard, Router};
pub use session::{Session, SessionStore};
