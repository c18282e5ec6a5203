//! Process environment shim
//!
//! Credential selection reads a handful of well-known variables. [`Env::real`]
//! snapshots the process environment when it is called; later changes to the
//! process environment are not visible through it. Tests supply a fixed set of
//! variables with [`Env::from_slice`].

use std::collections::HashMap;
use std::sync::Arc;

pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ACCESS_KEY_ID_LEGACY: &str = "AWS_ACCESS_KEY";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const SECRET_ACCESS_KEY_LEGACY: &str = "AWS_SECRET_KEY";
pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const PROFILE: &str = "AWS_PROFILE";
pub const PROFILE_LEGACY: &str = "AWS_DEFAULT_PROFILE";
pub const SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
/// Base URL override for the instance metadata service
pub const METADATA_URL: &str = "AWS_METADATA_URL";

/// Read-only snapshot of environment variables
#[derive(Debug, Clone)]
pub struct Env(Arc<HashMap<String, String>>);

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

impl Env {
    /// Capture the real process environment. Variables whose name or value
    /// is not valid UTF-8 are skipped.
    pub fn real() -> Self {
        let map = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self(Arc::new(map))
    }

    /// Use a fixed set of variables, ignoring the process environment
    pub fn from_slice(vars: &[(&str, &str)]) -> Self {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self(Arc::new(map))
    }

    /// Look up a variable. Empty values are treated as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.is_empty()).cloned()
    }

    /// Look up the first variable that is set, in order
    pub fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Home directory as reported by the environment
    pub fn home_dir(&self) -> Option<String> {
        self.first_of(&["HOME", "USERPROFILE"])
    }
}
