//! Core of the Google Cloud client libraries
//!
//! This crate provides the pieces every service client shares:
//!
//! - [`project`] - discovery of the implicit project id
//! - [`options`] - service options and their builder
//! - [`auth`] - Application Default Credentials with token caching
//! - [`env`] - injectable view of the process environment
//! - [`bigquery`] - BigQuery service options and table definitions
//!
//! # Example
//!
//! ```ignore
//! use gcloud_core::project::ProjectResolver;
//!
//! async fn example() {
//!     match ProjectResolver::new().resolve().await {
//!         Some(found) => println!("{} (from {})", found.project_id, found.source),
//!         None => println!("no project configured"),
//!     }
//! }
//! ```

pub mod auth;
pub mod bigquery;
pub mod env;
pub mod error;
pub mod options;
pub mod project;

pub use auth::AuthCredentials;
pub use env::Environment;
pub use error::ConfigurationError;
pub use options::{ServiceFactory, ServiceOptions, ServiceOptionsBuilder, ServiceSpec};
pub use project::{ProjectResolver, ProjectSource, ResolvedProject};

/// Library name reported to services
pub const LIBRARY_NAME: &str = "gcloud-core";

/// Version injected at compile time via GCLOUD_CORE_VERSION env var (set by CI/CD),
/// or the package version for local builds.
pub const LIBRARY_VERSION: &str = match option_env!("GCLOUD_CORE_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// `<library name>/<library version>`, also sent as the HTTP user agent
pub fn application_name() -> String {
    format!("{}/{}", LIBRARY_NAME, LIBRARY_VERSION)
}
