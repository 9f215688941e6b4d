use thiserror::Error;

/// One error describing a single handler's failure during a dispatch round.
#[derive(Debug, Error)]
#[error("handler [{handler}] failed: {source}")]
pub struct HandlerError {
    pub handler: String,
    #[source]
    pub source: anyhow::Error,
}

/// Crate-wide error taxonomy, mirroring the kinds in the coordination design:
/// configuration errors are fatal at startup, validation errors are per-request
/// client errors, dispatch errors aggregate per-handler failures, remote errors
/// are retried by the task runner before surfacing, not-found is an idempotent
/// no-op where the caller allows it, and ambiguity is never guessed at.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("validation error: {param}: {detail}")]
    Validation { param: String, detail: String },

    #[error("{} handler(s) failed during dispatch", .0.len())]
    Dispatch(Vec<HandlerError>),

    #[error("remote call to {component} failed: {source}")]
    Remote {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("ambiguous resource match: {0}")]
    Ambiguous(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn validation(param: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Validation {
            param: param.into(),
            detail: detail.into(),
        }
    }

    /// Retryable error classes for the task runner: network timeouts and
    /// connection failures only. Config, validation and ambiguity errors
    /// are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Remote { .. } => true,
            Error::NotFound(_) => true,
            _ => false,
        }
    }
}

/// Configuration-loading and validation errors, categorized per the
/// config validator's failure modes. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tokens in resource key [{resource_key}]: {detail}")]
    InvalidTokens {
        resource_key: String,
        detail: String,
    },

    #[error("invalid resource key referenced: {0}")]
    InvalidResourceKey(String),

    #[error("invalid service key: {0}")]
    InvalidServiceKey(String),

    #[error("mapping parse error in rule `{rule}`: {detail}")]
    InvalidMapping { rule: String, detail: String },

    #[error("{0}")]
    Generic(String),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
