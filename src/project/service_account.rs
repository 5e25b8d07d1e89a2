//! Service-account key file
//!
//! `GOOGLE_APPLICATION_CREDENTIALS` points at a JSON key whose `project_id`
//! names the project the account belongs to.

use crate::env::Environment;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Variable holding the path to the service-account key
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    project_id: String,
}

/// Project id from the service-account key file, if one is configured and readable
pub fn project_id(env: &Environment) -> Option<String> {
    let path = env.var(CREDENTIALS_ENV)?;

    match read_project_id(Path::new(&path)) {
        Ok(project) => Some(project),
        Err(e) => {
            tracing::debug!("Ignoring service account key {}: {:#}", path, e);
            None
        }
    }
}

fn read_project_id(path: &Path) -> Result<String> {
    let file = File::open(path).context("Failed to open credentials file")?;
    let key: ServiceAccountKey = serde_json::from_reader(BufReader::new(file))
        .context("Failed to parse credentials file")?;
    Ok(key.project_id)
}
