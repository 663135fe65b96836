//! Async client for the vManage `/dataservice/` REST API.
//!
//! [`VmanageClient`] handles the session handshake, XSRF token, envelope
//! unwrapping and error mapping. Resource groups live in their own
//! modules as inherent methods on the client. Entity bodies are returned
//! as `serde_json::Value`.

pub mod actions;
pub mod auth;
pub mod client;
pub mod definitions;
pub mod error;
pub mod lists;
pub mod models;
pub mod policies;
pub mod templates;
pub mod transport;

pub use client::VmanageClient;
pub use definitions::DEFINITION_TYPES;
pub use error::Error;
pub use models::{
    ActionDeviceStatus, ActionHandle, ActionStatus, AttachedDevice, InputColumn, TemplateInput,
    UpdateResponse,
};
pub use policies::PolicyScope;
pub use transport::{TlsMode, TransportConfig};
