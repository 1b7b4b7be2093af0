//! Configuration of the console tests
//!
//! The configuration is read once from environment variables when a
//! test starts. Every variable is optional.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Settings of a console test run
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// URL of the Fabric8 console (`FABRIC8_CONSOLE_URL`)
    pub console_url: String,
    /// Namespace the CD pipeline runs in (`FABRIC8_NAMESPACE`)
    pub namespace: String,
    /// Endpoint of the WebDriver server (`WEBDRIVER_URL`)
    pub webdriver_url: String,
    /// User logging into the console (`FABRIC8_USER`)
    pub user: String,
    /// Password of the console user (`FABRIC8_PASSWORD`)
    pub password: String,
    /// Gogs user which owns the created projects (`FABRIC8_GOGS_USER`)
    pub gogs_user: String,
    /// Interval between two evaluations of a convergence wait
    /// (`FABRIC8_POLL_INTERVAL_SECS`)
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            console_url: String::from("http://fabric8.vagrant.f8"),
            namespace: String::from("fabric8-test"),
            webdriver_url: String::from("http://localhost:4444"),
            user: String::from("admin"),
            password: String::from("admin"),
            gogs_user: String::from("gogsadmin"),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration with the given variable lookup.
    ///
    /// Empty values are treated like unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str, default: String| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(default)
        };

        let poll_interval = match lookup("FABRIC8_POLL_INTERVAL_SECS")
            .filter(|value| !value.trim().is_empty())
        {
            Some(value) => {
                let secs = value.trim().parse::<u64>().map_err(|error| {
                    Error::Environment(format!(
                        "FABRIC8_POLL_INTERVAL_SECS [{}] is not a number of seconds: {}",
                        value, error
                    ))
                })?;
                if secs == 0 {
                    return Err(Error::Environment(String::from(
                        "FABRIC8_POLL_INTERVAL_SECS must be greater than 0",
                    )));
                }
                Duration::from_secs(secs)
            }
            None => defaults.poll_interval,
        };

        Ok(Config {
            console_url: var("FABRIC8_CONSOLE_URL", defaults.console_url)
                .trim_end_matches('/')
                .to_owned(),
            namespace: var("FABRIC8_NAMESPACE", defaults.namespace),
            webdriver_url: var("WEBDRIVER_URL", defaults.webdriver_url),
            user: var("FABRIC8_USER", defaults.user),
            password: var("FABRIC8_PASSWORD", defaults.password),
            gogs_user: var("FABRIC8_GOGS_USER", defaults.gogs_user),
            poll_interval,
        })
    }
}
