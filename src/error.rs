//! Errors of the console tests

use std::time::Duration;

use thirtyfour::error::WebDriverError;

/// Result type of the console tests
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reasons why a step of the console tests failed
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A precondition about the cluster state is false.
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// A convergence wait exceeded its deadline.
    #[error("Timed out after {timeout:?} waiting for {condition}; last failure: {last_failure}")]
    Timeout {
        condition: String,
        timeout: Duration,
        last_failure: String,
    },

    /// Required configuration is missing, empty, or malformed.
    #[error("Environment error: {0}")]
    Environment(String),

    /// Any other failure while driving the UI, wrapped with the step it
    /// occurred in.
    #[error("{context} failed: {source:#}")]
    Unexpected {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),

    #[error("WebDriver request failed: {0}")]
    WebDriver(#[from] WebDriverError),

    #[error("Build server request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Wraps collaborator failures into [`Error::Unexpected`] with the
    /// given step context.
    ///
    /// Assertion, timeout, environment, and already wrapped errors are
    /// returned unchanged so that their message stays intact.
    pub fn in_step(self, context: &str) -> Error {
        match self {
            Error::Kube(_) | Error::WebDriver(_) | Error::Http(_) => Error::Unexpected {
                context: context.to_owned(),
                source: anyhow::Error::new(self),
            },
            other => other,
        }
    }

    /// Returns true if the Kubernetes API rejected a request with one of
    /// the given HTTP status codes.
    pub fn is_api_status(&self, codes: &[u16]) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(response)) if codes.contains(&response.code))
    }
}
