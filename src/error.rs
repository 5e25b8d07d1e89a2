//! Configuration errors
//!
//! Project discovery itself never fails; these are raised only when a
//! [`ServiceOptions`](crate::options::ServiceOptions) cannot be built.

use thiserror::Error;

/// Errors raised while building service options
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The service needs a project and none was given or discovered.
    #[error(
        "A project ID is required for the {service} service but could not be determined \
         from the builder or the environment. Please set a project ID using the builder."
    )]
    MissingProjectId { service: &'static str },

    /// The configured host is not an absolute URL.
    #[error("Invalid service host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },
}
