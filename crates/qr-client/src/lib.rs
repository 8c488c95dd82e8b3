//! # Qryti client core
//!
//! Authenticated API access and list-view state for the Qryti AI compliance
//! platform console.
//!
//! ## Features
//!
//! - **Session**: access and refresh tokens plus the cached user profile,
//!   persisted under `accessToken`, `refreshToken` and `user`
//! - **Request gateway**: bearer auth with one refresh-and-retry per call and a
//!   single shared refresh for concurrent expiries
//! - **Resource adapters**: users, assessments, certificates and evidence files
//! - **List controllers**: debounced filters, pagination and epoch-tagged
//!   fetches where the last issued request always wins
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qr_client::{ClientConfig, ListViewController, RequestGateway, Session, UsersAdapter};
//! use qr_client::list::{ListRenderer, ListView};
//! use std::sync::Arc;
//!
//! struct Print;
//!
//! impl ListRenderer<qr_common::User> for Print {
//!     fn render(&self, view: &ListView<qr_common::User>) {
//!         println!("{} of {} users", view.items.len(), view.total);
//!     }
//!     fn show_error(&self, context: &str, error: &qr_client::Error) {
//!         eprintln!("{}: {}", context, error.user_message());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Arc::new(Session::in_memory());
//!     let gateway = RequestGateway::new(ClientConfig::new("https://app.qryti.com"), session)?;
//!
//!     let users = ListViewController::new(UsersAdapter, Arc::new(gateway), Arc::new(Print));
//!     users.set_filter("status", "active")?;
//!     users.fetch().await;
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod list;
pub mod request;
pub mod resources;
pub mod session;
pub mod store;
pub mod validation;

// Re-export main types
pub use account::AuthApi;
pub use config::ClientConfig;
pub use dispatch::{Command, Dispatcher, Table};
pub use error::{Error, ErrorKind, Result};
pub use gateway::{RequestExecutor, RequestGateway, SessionEvent};
pub use list::{FetchOutcome, ListRenderer, ListSettings, ListView, ListViewController};
pub use request::{ApiResponse, RequestDescriptor};
pub use resources::{
    AssessmentsAdapter, CertificatesAdapter, FilesAdapter, ListQuery, ResourceAdapter, ResourceClient,
    UsersAdapter,
};
pub use session::{Session, Token};
pub use store::{CredentialStore, FileStore, MemoryStore};
