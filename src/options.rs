//! Service options
//!
//! [`ServiceOptions`] carries what every service client needs: the project,
//! the host, the credentials and the factory that creates the service
//! itself. Per-service behaviour (default host, scopes, whether a project is
//! mandatory) comes from a [`ServiceSpec`] implementation.
//!
//! # Example
//!
//! ```ignore
//! use gcloud_core::bigquery::BigQueryOptions;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let options = BigQueryOptions::builder().build().await?;
//!     let bigquery = options.service();
//!     println!("{}", bigquery.datasets_url());
//!     Ok(())
//! }
//! ```

use crate::auth::AuthCredentials;
use crate::error::ConfigurationError;
use crate::project::{ProjectResolver, ProjectSource};
use std::fmt;
use std::sync::{Arc, OnceLock};
use url::Url;

/// Host used by services that do not override it
pub const DEFAULT_HOST: &str = "https://www.googleapis.com";

/// Static description of a service
pub trait ServiceSpec: Sized + 'static {
    /// Service handle created from the options
    type Service: Send + Sync;

    /// Human readable service name, used in error messages
    const NAME: &'static str;

    /// OAuth scopes the service needs
    fn scopes() -> &'static [&'static str];

    fn default_host() -> &'static str {
        DEFAULT_HOST
    }

    /// Whether building options without a project is an error
    fn project_id_required() -> bool {
        true
    }

    /// Factory used when the builder was not given one
    fn default_factory() -> Arc<dyn ServiceFactory<Self>>;
}

/// Creates a service from its options
pub trait ServiceFactory<S: ServiceSpec>: Send + Sync {
    fn create(&self, options: &ServiceOptions<S>) -> S::Service;
}

impl<S, F> ServiceFactory<S> for F
where
    S: ServiceSpec,
    F: Fn(&ServiceOptions<S>) -> S::Service + Send + Sync,
{
    fn create(&self, options: &ServiceOptions<S>) -> S::Service {
        self(options)
    }
}

/// Resolved configuration of one service
pub struct ServiceOptions<S: ServiceSpec> {
    project_id: Option<String>,
    project_source: Option<ProjectSource>,
    host: String,
    credentials: AuthCredentials,
    service_factory: Arc<dyn ServiceFactory<S>>,
    service: OnceLock<S::Service>,
}

impl<S: ServiceSpec> ServiceOptions<S> {
    pub fn builder() -> ServiceOptionsBuilder<S> {
        ServiceOptionsBuilder::new()
    }

    /// The project id. `None` only for services that do not require one.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Where the project id was discovered, `None` if it was set explicitly
    pub fn project_source(&self) -> Option<ProjectSource> {
        self.project_source
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn credentials(&self) -> &AuthCredentials {
        &self.credentials
    }

    pub fn scopes(&self) -> &'static [&'static str] {
        S::scopes()
    }

    /// The service, created on first use and kept for the lifetime of the options
    pub fn service(&self) -> &S::Service {
        self.service
            .get_or_init(|| self.service_factory.create(self))
    }

    /// `gcloud-core/<version>`
    pub fn application_name(&self) -> String {
        crate::application_name()
    }

    pub fn library_name(&self) -> &'static str {
        crate::LIBRARY_NAME
    }

    pub fn library_version(&self) -> &'static str {
        crate::LIBRARY_VERSION
    }

    /// Builder pre-filled with these options. The project id is kept as an
    /// explicit value, so rebuilding never runs discovery again.
    pub fn to_builder(&self) -> ServiceOptionsBuilder<S> {
        ServiceOptionsBuilder {
            project_id: self.project_id.clone(),
            host: Some(self.host.clone()),
            credentials: Some(self.credentials.clone()),
            service_factory: Some(self.service_factory.clone()),
            resolver: None,
        }
    }
}

impl<S: ServiceSpec> fmt::Debug for ServiceOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceOptions")
            .field("service", &S::NAME)
            .field("project_id", &self.project_id)
            .field("project_source", &self.project_source)
            .field("host", &self.host)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Options are equal when they configure the same service for the same
/// project, host and credentials. How the project was found does not matter.
impl<S: ServiceSpec> PartialEq for ServiceOptions<S> {
    fn eq(&self, other: &Self) -> bool {
        self.project_id == other.project_id
            && self.host == other.host
            && self.credentials == other.credentials
    }
}

/// Builder for [`ServiceOptions`]
pub struct ServiceOptionsBuilder<S: ServiceSpec> {
    project_id: Option<String>,
    host: Option<String>,
    credentials: Option<AuthCredentials>,
    service_factory: Option<Arc<dyn ServiceFactory<S>>>,
    resolver: Option<ProjectResolver>,
}

impl<S: ServiceSpec> ServiceOptionsBuilder<S> {
    pub fn new() -> Self {
        Self {
            project_id: None,
            host: None,
            credentials: None,
            service_factory: None,
            resolver: None,
        }
    }

    /// Use this project and skip discovery
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn credentials(mut self, credentials: AuthCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn service_factory(mut self, factory: Arc<dyn ServiceFactory<S>>) -> Self {
        self.service_factory = Some(factory);
        self
    }

    /// Resolver used when no project id is set
    pub fn resolver(mut self, resolver: ProjectResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub async fn build(self) -> Result<ServiceOptions<S>, ConfigurationError> {
        let (project_id, project_source) = match self.project_id {
            Some(project_id) => (Some(project_id), None),
            None => {
                let resolver = self.resolver.unwrap_or_default();
                match resolver.resolve().await {
                    Some(resolved) => (Some(resolved.project_id), Some(resolved.source)),
                    None => (None, None),
                }
            }
        };

        if project_id.is_none() && S::project_id_required() {
            return Err(ConfigurationError::MissingProjectId { service: S::NAME });
        }

        let host = self
            .host
            .unwrap_or_else(|| S::default_host().to_string());
        if let Err(source) = Url::parse(&host) {
            return Err(ConfigurationError::InvalidHost { host, source });
        }

        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => default_credentials().await,
        };

        Ok(ServiceOptions {
            project_id,
            project_source,
            host,
            credentials,
            service_factory: self.service_factory.unwrap_or_else(S::default_factory),
            service: OnceLock::new(),
        })
    }
}

impl<S: ServiceSpec> Default for ServiceOptionsBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Application Default Credentials, or no auth when none are available
async fn default_credentials() -> AuthCredentials {
    match AuthCredentials::application_default().await {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::warn!("Application default credentials unavailable: {:#}", e);
            AuthCredentials::no_auth()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::project::{MetadataProbe, PROJECT_ENV};

    /// Service with an optional project
    struct Directory;

    #[derive(Debug)]
    struct DirectoryClient {
        project: Option<String>,
        host: String,
    }

    impl ServiceSpec for Directory {
        type Service = DirectoryClient;
        const NAME: &'static str = "Directory";

        fn scopes() -> &'static [&'static str] {
            &["https://www.googleapis.com/auth/directory"]
        }

        fn default_host() -> &'static str {
            "https://directory.googleapis.com"
        }

        fn project_id_required() -> bool {
            false
        }

        fn default_factory() -> Arc<dyn ServiceFactory<Self>> {
            Arc::new(|options: &ServiceOptions<Directory>| DirectoryClient {
                project: options.project_id().map(str::to_string),
                host: options.host().to_string(),
            })
        }
    }

    fn offline(env: Environment) -> ProjectResolver {
        ProjectResolver::new()
            .with_environment(env)
            .with_metadata_probe(MetadataProbe::disabled())
    }

    #[tokio::test]
    async fn test_optional_project_may_be_absent() {
        let options = ServiceOptions::<Directory>::builder()
            .resolver(offline(Environment::empty()))
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap();

        assert_eq!(options.project_id(), None);
        assert_eq!(options.project_source(), None);
        assert_eq!(options.host(), "https://directory.googleapis.com");
        assert_eq!(options.service().project, None);
    }

    #[tokio::test]
    async fn test_explicit_project_skips_discovery() {
        let options = ServiceOptions::<Directory>::builder()
            .project_id("explicit")
            .resolver(offline(Environment::empty().with_var(PROJECT_ENV, "from-env")))
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap();

        assert_eq!(options.project_id(), Some("explicit"));
        assert_eq!(options.project_source(), None);
    }

    #[tokio::test]
    async fn test_discovered_project_records_source() {
        let options = ServiceOptions::<Directory>::builder()
            .resolver(offline(Environment::empty().with_var(PROJECT_ENV, "from-env")))
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap();

        assert_eq!(options.project_id(), Some("from-env"));
        assert_eq!(options.project_source(), Some(ProjectSource::Environment));
    }

    #[tokio::test]
    async fn test_invalid_host() {
        let err = ServiceOptions::<Directory>::builder()
            .host("not a url")
            .resolver(offline(Environment::empty()))
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigurationError::InvalidHost { .. }));
    }

    #[tokio::test]
    async fn test_injected_factory_and_cached_service() {
        let factory = |options: &ServiceOptions<Directory>| DirectoryClient {
            project: Some("from-factory".to_string()),
            host: options.host().to_string(),
        };

        let options = ServiceOptions::<Directory>::builder()
            .host("http://localhost:8080")
            .service_factory(Arc::new(factory))
            .resolver(offline(Environment::empty()))
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap();

        let first = options.service() as *const DirectoryClient;
        let second = options.service() as *const DirectoryClient;
        assert_eq!(first, second);
        assert_eq!(options.service().project.as_deref(), Some("from-factory"));
        assert_eq!(options.service().host, "http://localhost:8080");
    }

    #[test]
    fn test_to_builder_keeps_values() {
        let options = tokio_test::block_on(
            ServiceOptions::<Directory>::builder()
                .resolver(offline(Environment::empty().with_var(PROJECT_ENV, "from-env")))
                .credentials(AuthCredentials::no_auth())
                .build(),
        )
        .unwrap();

        let rebuilt = tokio_test::block_on(
            options
                .to_builder()
                .resolver(offline(Environment::empty()))
                .build(),
        )
        .unwrap();

        assert_eq!(rebuilt.project_id(), Some("from-env"));
        assert_eq!(rebuilt.project_source(), None);
        assert_eq!(rebuilt.host(), options.host());
        assert!(rebuilt.credentials().is_no_auth());
        assert_eq!(rebuilt.library_name(), "gcloud-core");
        assert!(rebuilt.application_name().starts_with("gcloud-core/"));
    }

    #[tokio::test]
    async fn test_equal_options() {
        let build = |project: &'static str| {
            ServiceOptions::<Directory>::builder()
                .project_id(project)
                .credentials(AuthCredentials::no_auth())
                .resolver(offline(Environment::empty()))
                .build()
        };

        let first = build("proj-a").await.unwrap();
        let second = build("proj-a").await.unwrap();
        let other = build("proj-b").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first, first.to_builder().build().await.unwrap());

        let moved = first.to_builder().host("http://localhost:9050").build().await.unwrap();
        assert_ne!(first, moved);
    }
}
