//! Environment view
//!
//! Everything the project resolver learns about the host goes through an
//! [`Environment`]: variables, the property layer, the home directory and the
//! platform flag. The process environment is the default; tests and sandboxed
//! hosts build an isolated one instead.

use std::collections::HashMap;
use std::path::PathBuf;

/// Read-only view of the host environment
#[derive(Debug, Clone)]
pub struct Environment {
    properties: HashMap<String, String>,
    vars: HashMap<String, String>,
    /// Fall through to the real process environment for unknown variables
    inherit: bool,
    home_dir: Option<PathBuf>,
    windows: bool,
}

impl Environment {
    /// The real process environment
    pub fn process() -> Self {
        Self {
            properties: HashMap::new(),
            vars: HashMap::new(),
            inherit: true,
            home_dir: None,
            windows: cfg!(windows),
        }
    }

    /// An environment that inherits nothing from the process
    pub fn empty() -> Self {
        Self {
            inherit: false,
            ..Self::process()
        }
    }

    /// Set a property. Properties are consulted before variables of the same name.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set (or shadow) an environment variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Override the home directory
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Override the platform flag used for config directory rules
    pub fn with_windows(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    pub fn var(&self, key: &str) -> Option<String> {
        if let Some(value) = self.vars.get(key) {
            return Some(value.clone());
        }
        if self.inherit {
            return std::env::var(key).ok();
        }
        None
    }

    /// Property first, then the variable of the same name. A set property wins even when empty.
    pub fn property_or_var(&self, key: &str) -> Option<String> {
        self.property(key).or_else(|| self.var(key))
    }

    pub fn home_dir(&self) -> Option<PathBuf> {
        if self.home_dir.is_some() {
            return self.home_dir.clone();
        }
        if self.inherit {
            return dirs::home_dir();
        }
        None
    }

    pub fn is_windows(&self) -> bool {
        self.windows
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::process()
    }
}
