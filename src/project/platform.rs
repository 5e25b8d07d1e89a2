//! Managed-platform identity
//!
//! Managed runtimes expose a service-account name such as
//! `my-app@appspot.gserviceaccount.com`; the project id is the part before
//! the `@`. The runtime is optional, so the host registers a provider when it
//! has one and the resolver treats a missing provider like a failing one.

use anyhow::Result;

/// Identity service of a managed runtime
pub trait PlatformIdentityProvider: Send + Sync {
    /// Name of the service account the workload runs as
    fn service_account_name(&self) -> Result<String>;
}

impl<F> PlatformIdentityProvider for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn service_account_name(&self) -> Result<String> {
        self()
    }
}

/// Ask the provider for its account and derive the project id from it
pub(crate) fn project_id(provider: &dyn PlatformIdentityProvider) -> Option<String> {
    let account = match provider.service_account_name() {
        Ok(account) => account,
        Err(e) => {
            tracing::debug!("Platform identity unavailable: {:#}", e);
            return None;
        }
    };

    let project = project_from_account(&account);
    if project.is_none() {
        tracing::debug!("Platform service account name has no `@`");
    }
    project.map(str::to_string)
}

/// Substring before the first `@`
fn project_from_account(account: &str) -> Option<&str> {
    account.split_once('@').map(|(project, _)| project)
}
