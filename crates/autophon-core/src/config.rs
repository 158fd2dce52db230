//! Runtime configuration.
//!
//! Configuration comes from environment variables. An optional `.env` file
//! is read first; variables already present in the process environment take
//! precedence over the file.

use crate::constants::{
    DEFAULT_CANCEL_CODE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_OPEN_CODE,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::{AdminCodes, DialCode, Error, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const ENV_LOGIN_URL: &str = "EASYDOOR_LOGINURL";
pub const ENV_OPEN_URL: &str = "EASYDOOR_OPENDOOR";
pub const ENV_USERNAME: &str = "EASYDOOR_USERNAME";
pub const ENV_PASSWORD: &str = "EASYDOOR_PASSWORD";
pub const ENV_OPEN_CODE: &str = "AUTOPHON_OPEN_CODE";
pub const ENV_CANCEL_CODE: &str = "AUTOPHON_CANCEL_CODE";
pub const ENV_REQUEST_TIMEOUT: &str = "AUTOPHON_REQUEST_TIMEOUT_SECS";
pub const ENV_HTTP_TIMEOUT: &str = "AUTOPHON_HTTP_TIMEOUT_SECS";

/// Connection settings of the door-lock backend.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub login_url: String,
    pub open_url: String,
    pub username: String,
    pub password: String,
    /// Timeout of each individual HTTP call.
    pub http_timeout: Duration,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("login_url", &self.login_url)
            .field("open_url", &self.open_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Complete autophon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendConfig,
    pub codes: AdminCodes,
    /// How long a request rings before it times out.
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment, merged over the
    /// contents of `env_file` when that file exists.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a variable is missing
    /// or invalid.
    pub fn from_env(env_file: impl AsRef<Path>) -> Result<Self> {
        let mut vars = HashMap::new();
        let path = env_file.as_ref();
        if path.exists() {
            debug!("Reading environment file {}", path.display());
            vars = parse_env_file(&std::fs::read_to_string(path)?)?;
        }
        vars.extend(utf8_vars(std::env::vars_os()));
        Self::from_vars(&vars)
    }

    /// Load configuration from a map of variables (for testing).
    ///
    /// # Errors
    /// Returns `Error::MissingConfig` for a missing required variable and
    /// `Error::Config` for a malformed one.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let backend = BackendConfig {
            login_url: required(vars, ENV_LOGIN_URL)?,
            open_url: required(vars, ENV_OPEN_URL)?,
            username: required(vars, ENV_USERNAME)?,
            password: required(vars, ENV_PASSWORD)?,
            http_timeout: seconds(vars, ENV_HTTP_TIMEOUT, DEFAULT_HTTP_TIMEOUT_SECS)?,
        };

        let open_prefix = code(vars, ENV_OPEN_CODE, DEFAULT_OPEN_CODE)?;
        let cancel = code(vars, ENV_CANCEL_CODE, DEFAULT_CANCEL_CODE)?;

        Ok(Config {
            backend,
            codes: AdminCodes::new(open_prefix, cancel)?,
            request_timeout: seconds(vars, ENV_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT_SECS)?,
        })
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped.
///
/// # Errors
/// Returns `Error::Config` for a line without `=`.
pub fn parse_env_file(contents: &str) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::Config(format!("line {}: expected KEY=VALUE", number + 1))
        })?;
        vars.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(vars)
}

/// Keep the variables whose name and value are valid UTF-8.
///
/// Other entries cannot name an autophon setting, so they are skipped.
fn utf8_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                warn!("Ignoring environment variable {key} with a non UTF-8 value");
                None
            }
            (Err(key), _) => {
                debug!("Ignoring environment variable {:?} with a non UTF-8 name", key);
                None
            }
        })
        .collect()
}

fn required(vars: &HashMap<String, String>, key: &str) -> Result<String> {
    vars.get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| Error::MissingConfig(key.to_string()))
}

fn seconds(vars: &HashMap<String, String>, key: &str, default: u64) -> Result<Duration> {
    let Some(raw) = vars.get(key) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::Config(format!(
            "{key} must be a positive number of seconds, got {raw:?}"
        ))),
    }
}

fn code(vars: &HashMap<String, String>, key: &str, default: &str) -> Result<DialCode> {
    let raw = vars.get(key).map(String::as_str).unwrap_or(default);
    raw.parse()
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}
