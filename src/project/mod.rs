//! Project discovery
//!
//! When the caller does not name a project, [`ProjectResolver`] looks for one
//! in the places a Google Cloud workload usually carries it. Strategies run
//! in a fixed order and the first one that finds something wins:
//!
//! 1. the `GCLOUD_PROJECT` property, then the variable of the same name
//! 2. the managed-platform identity, if a [`PlatformIdentityProvider`] is registered
//! 3. the service-account key named by `GOOGLE_APPLICATION_CREDENTIALS`
//! 4. the active gcloud CLI configuration ([`cloudsdk`])
//! 5. the metadata server ([`MetadataProbe`])
//!
//! Most strategies fail in most environments. A failure is never an error,
//! it only moves the search on to the next strategy.
//!
//! # Example
//!
//! ```ignore
//! use gcloud_core::project::ProjectResolver;
//!
//! async fn example() {
//!     if let Some(project) = ProjectResolver::new().resolve_project_id().await {
//!         println!("using {project}");
//!     }
//! }
//! ```

pub mod cloudsdk;
pub mod metadata;
pub mod platform;
pub mod service_account;

pub use metadata::MetadataProbe;
pub use platform::PlatformIdentityProvider;

use crate::env::Environment;
use std::fmt;
use std::sync::Arc;

/// Property and variable naming the project explicitly
pub const PROJECT_ENV: &str = "GCLOUD_PROJECT";

/// Where a project id was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectSource {
    Environment,
    PlatformIdentity,
    ServiceAccount,
    CloudSdkConfig,
    MetadataServer,
}

impl fmt::Display for ProjectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectSource::Environment => "environment",
            ProjectSource::PlatformIdentity => "platform identity",
            ProjectSource::ServiceAccount => "service account key",
            ProjectSource::CloudSdkConfig => "gcloud configuration",
            ProjectSource::MetadataServer => "metadata server",
        };
        f.write_str(name)
    }
}

/// A discovered project id and its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub project_id: String,
    pub source: ProjectSource,
}

/// Ordered fallback chain over every project source
#[derive(Clone)]
pub struct ProjectResolver {
    env: Environment,
    platform: Option<Arc<dyn PlatformIdentityProvider>>,
    metadata: MetadataProbe,
}

impl ProjectResolver {
    /// Resolver over the process environment with no platform identity
    pub fn new() -> Self {
        Self {
            env: Environment::process(),
            platform: None,
            metadata: MetadataProbe::new(),
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Register the managed runtime's identity service
    pub fn with_platform_identity(mut self, provider: Arc<dyn PlatformIdentityProvider>) -> Self {
        self.platform = Some(provider);
        self
    }

    pub fn with_metadata_probe(mut self, probe: MetadataProbe) -> Self {
        self.metadata = probe;
        self
    }

    /// Project id from the first strategy that finds one
    pub async fn resolve_project_id(&self) -> Option<String> {
        self.resolve().await.map(|resolved| resolved.project_id)
    }

    /// Like [`resolve_project_id`](Self::resolve_project_id), also reporting the source
    pub async fn resolve(&self) -> Option<ResolvedProject> {
        if let Some(project) = self.env.property_or_var(PROJECT_ENV) {
            return Some(found(project, ProjectSource::Environment));
        }

        let platform = self
            .platform
            .as_deref()
            .and_then(|provider| platform::project_id(provider));
        if let Some(project) = platform {
            return Some(found(project, ProjectSource::PlatformIdentity));
        }

        if let Some(project) = service_account::project_id(&self.env) {
            return Some(found(project, ProjectSource::ServiceAccount));
        }

        if let Some(project) = cloudsdk::project_id(&self.env) {
            return Some(found(project, ProjectSource::CloudSdkConfig));
        }

        if let Some(project) = self.metadata.project_id().await {
            return Some(found(project, ProjectSource::MetadataServer));
        }

        tracing::debug!("Project id could not be determined from the environment");
        None
    }
}

impl Default for ProjectResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProjectResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectResolver")
            .field("env", &self.env)
            .field("platform", &self.platform.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

fn found(project_id: String, source: ProjectSource) -> ResolvedProject {
    tracing::debug!("Using project {} from {}", project_id, source);
    ResolvedProject { project_id, source }
}
