//! BigQuery
//!
//! Service options for BigQuery and the table model that travels over its
//! REST API.
//!
//! # Module Structure
//!
//! - [`table`] - standard table definitions, schemas and their wire form

pub mod table;

pub use table::{
    Field, FieldMode, FieldType, PartitioningType, Schema, StandardTableDefinition,
    StreamingBuffer, Table, TimePartitioning,
};

use crate::options::{ServiceFactory, ServiceOptions, ServiceSpec};
use std::sync::Arc;

/// OAuth scope for BigQuery
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

/// Marker type describing the BigQuery service
#[derive(Debug, Clone, Copy)]
pub struct BigQueryApi;

/// Options for a BigQuery client
pub type BigQueryOptions = ServiceOptions<BigQueryApi>;

impl ServiceSpec for BigQueryApi {
    type Service = BigQuery;
    const NAME: &'static str = "BigQuery";

    fn scopes() -> &'static [&'static str] {
        &[BIGQUERY_SCOPE]
    }

    fn default_factory() -> Arc<dyn ServiceFactory<Self>> {
        Arc::new(|options: &BigQueryOptions| BigQuery::from_options(options))
    }
}

/// BigQuery service handle
#[derive(Debug, Clone)]
pub struct BigQuery {
    project_id: String,
    host: String,
}

impl BigQuery {
    pub fn from_options(options: &BigQueryOptions) -> Self {
        Self {
            project_id: options.project_id().unwrap_or_default().to_string(),
            host: options.host().trim_end_matches('/').to_string(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    // =========================================================================
    // REST API helpers
    // =========================================================================

    /// Build BigQuery project URL
    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/{}",
            self.host,
            urlencoding::encode(&self.project_id),
            path
        )
    }

    pub fn datasets_url(&self) -> String {
        self.project_url("datasets")
    }

    pub fn dataset_url(&self, dataset: &str) -> String {
        self.project_url(&format!("datasets/{}", urlencoding::encode(dataset)))
    }

    pub fn tables_url(&self, dataset: &str) -> String {
        format!("{}/tables", self.dataset_url(dataset))
    }

    pub fn table_url(&self, dataset: &str, table: &str) -> String {
        format!("{}/{}", self.tables_url(dataset), urlencoding::encode(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthCredentials;
    use crate::env::Environment;
    use crate::error::ConfigurationError;
    use crate::project::{MetadataProbe, ProjectResolver};

    fn offline() -> ProjectResolver {
        ProjectResolver::new()
            .with_environment(Environment::empty())
            .with_metadata_probe(MetadataProbe::disabled())
    }

    #[tokio::test]
    async fn test_project_is_required() {
        let err = BigQueryOptions::builder()
            .resolver(offline())
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::MissingProjectId { service: "BigQuery" }
        ));
        assert!(err.to_string().contains("project ID is required"));
    }

    #[tokio::test]
    async fn test_urls() {
        let options = BigQueryOptions::builder()
            .project_id("analytics-prod")
            .host("https://bigquery.googleapis.com/")
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap();

        let bigquery = options.service();
        assert_eq!(bigquery.project_id(), "analytics-prod");
        assert_eq!(options.scopes(), &[BIGQUERY_SCOPE]);
        assert_eq!(
            bigquery.datasets_url(),
            "https://bigquery.googleapis.com/bigquery/v2/projects/analytics-prod/datasets"
        );
        assert_eq!(
            bigquery.table_url("sales", "daily orders"),
            "https://bigquery.googleapis.com/bigquery/v2/projects/analytics-prod/datasets/sales/tables/daily%20orders"
        );
    }

    #[tokio::test]
    async fn test_default_host() {
        let options = BigQueryOptions::builder()
            .project_id("analytics-prod")
            .credentials(AuthCredentials::no_auth())
            .build()
            .await
            .unwrap();

        assert_eq!(options.host(), crate::options::DEFAULT_HOST);
        assert_eq!(
            options.service().tables_url("sales"),
            "https://www.googleapis.com/bigquery/v2/projects/analytics-prod/datasets/sales/tables"
        );
    }
}
