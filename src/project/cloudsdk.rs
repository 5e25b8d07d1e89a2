//! gcloud CLI configuration
//!
//! Reads the project from the Cloud SDK configuration directory: the active
//! named configuration under `configurations/`, or the legacy flat
//! `properties` file when that configuration does not exist.

use crate::env::Environment;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "CLOUDSDK_CONFIG";

/// Application data root on Windows
const APPDATA_ENV: &str = "APPDATA";

const DEFAULT_CONFIG_NAME: &str = "default";

/// Get the gcloud configuration directory
pub fn config_dir(env: &Environment) -> Option<PathBuf> {
    // Check CLOUDSDK_CONFIG environment variable first
    if let Some(path) = env.var(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(path));
    }

    if env.is_windows() {
        if let Some(appdata) = env.var(APPDATA_ENV) {
            return Some(PathBuf::from(appdata).join("gcloud"));
        }
    }

    env.home_dir().map(|home| home.join(".config").join("gcloud"))
}

/// Name of the active configuration, `default` if it cannot be determined
pub fn active_config(config_dir: &Path) -> String {
    let first_line = File::open(config_dir.join("active_config"))
        .and_then(|file| BufReader::new(file).lines().next().transpose());

    let name = match first_line {
        Ok(Some(line)) => line.trim().to_string(),
        _ => return DEFAULT_CONFIG_NAME.to_string(),
    };

    if name.is_empty() {
        return DEFAULT_CONFIG_NAME.to_string();
    }

    // Security: the name becomes part of a path, keep it inside configurations/
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        tracing::warn!("Invalid characters in active_config name, using default");
        return DEFAULT_CONFIG_NAME.to_string();
    }

    name
}

/// Project from the active gcloud configuration
pub fn project_id(env: &Environment) -> Option<String> {
    let config_dir = config_dir(env)?;
    let active = active_config(&config_dir);

    let config_path = config_dir
        .join("configurations")
        .join(format!("config_{}", active));

    let file = match File::open(&config_path) {
        Ok(file) => file,
        Err(_) => match File::open(config_dir.join("properties")) {
            Ok(file) => file,
            Err(_) => {
                tracing::debug!("No gcloud configuration in {}", config_dir.display());
                return None;
            }
        },
    };

    match parse_project(BufReader::new(file)) {
        Ok(project) => project,
        Err(e) => {
            tracing::debug!("Failed to read gcloud configuration: {}", e);
            None
        }
    }
}

/// Find the `project` key at the top of the file or in the `[core]` section.
///
/// Lines are trimmed; empty lines and `;` comments are skipped. A `[name]`
/// line switches the current section, and later headers simply replace
/// earlier ones. The first `project = value` seen outside any section or
/// inside `core` wins; everything after it is not read.
pub fn parse_project<R: BufRead>(reader: R) -> io::Result<Option<String>> {
    let mut section: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(name) = section_header(line) {
            section = Some(name.to_string());
        } else if section.as_deref().map_or(true, |s| s == "core") {
            if let Some(value) = project_value(line) {
                return Ok(Some(value.to_string()));
            }
        }
    }

    Ok(None)
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

/// Value of a `project\s*=\s*value` line
fn project_value(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("project")?.trim_start();
    let value = rest.strip_prefix('=')?;
    Some(value.trim_start())
}
