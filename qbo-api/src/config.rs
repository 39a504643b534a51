//! Service configuration
//!
//! The environment (production or sandbox) is fixed when a service is
//! constructed from a [`ServiceConfig`]; it is never read from global state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

const PRODUCTION_BASE_URL: &str = "https://quickbooks.api.intuit.com/v3/company";
const SANDBOX_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com/v3/company";

/// Which API host to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Sandbox => SANDBOX_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            other => Err(ApiError::Configuration(format!("unknown environment '{}'", other))),
        }
    }
}

/// Recognized configuration fields for a service instance
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub access_token: Option<String>,
    pub company_id: Option<String>,
    pub environment: Environment,
    /// Replaces the environment's host, e.g. for a proxy or a local test server
    pub base_url: Option<String>,
    /// Sent as `minorversion` on every request when set
    pub minor_version: Option<u32>,
    /// Trace request and response bodies
    pub log_bodies: bool,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    pub fn set_company_id(&mut self, company_id: impl Into<String>) {
        self.company_id = Some(company_id.into());
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.set_access_token(access_token);
        self
    }

    pub fn with_company_id(mut self, company_id: impl Into<String>) -> Self {
        self.set_company_id(company_id);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_minor_version(mut self, minor_version: u32) -> Self {
        self.minor_version = Some(minor_version);
        self
    }

    pub fn with_log_bodies(mut self, log_bodies: bool) -> Self {
        self.log_bodies = log_bodies;
        self
    }

    /// Base URL requests are built from
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.environment.base_url().to_string())
    }

    /// Load from a JSON document, e.g. a credentials file
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ApiError::Configuration(format!("invalid configuration JSON: {}", e)))
    }

    /// Load from `QBO_*` environment variables
    ///
    /// - `QBO_ACCESS_TOKEN`, `QBO_COMPANY_ID`
    /// - `QBO_ENVIRONMENT`: `production` (default) or `sandbox`
    /// - `QBO_BASE_URL`, `QBO_MINOR_VERSION`
    /// - `QBO_LOG_BODIES`: `1` or `true`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServiceConfig {
            access_token: lookup("QBO_ACCESS_TOKEN"),
            company_id: lookup("QBO_COMPANY_ID"),
            base_url: lookup("QBO_BASE_URL"),
            ..ServiceConfig::default()
        };

        if let Some(env) = lookup("QBO_ENVIRONMENT") {
            config.environment = env.parse()?;
        }
        if let Some(minor) = lookup("QBO_MINOR_VERSION") {
            let minor = minor.trim().parse().map_err(|_| {
                ApiError::Configuration(format!("QBO_MINOR_VERSION is not a number: '{}'", minor))
            })?;
            config.minor_version = Some(minor);
        }
        if let Some(flag) = lookup("QBO_LOG_BODIES") {
            config.log_bodies = matches!(flag.trim(), "1" | "true" | "TRUE" | "yes");
        }

        Ok(config)
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("company_id", &self.company_id)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("minor_version", &self.minor_version)
            .field("log_bodies", &self.log_bodies)
            .finish()
    }
}
