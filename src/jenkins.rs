//! Queries of the Jenkins build server

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::wait::{ConvergenceWaiter, PollFailure};

/// State of the most recent build of a job
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuildStatus {
    /// The job or its first build does not exist yet.
    Missing,
    /// The build is still running.
    Building,
    /// The build finished with the given result, e.g. `SUCCESS` or
    /// `FAILURE`.
    Finished(String),
}

impl BuildStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, BuildStatus::Finished(result) if result == "SUCCESS")
    }
}

/// A build server which runs the pipeline jobs
#[async_trait]
pub trait BuildServer: Send + Sync {
    /// Returns the state of the last build of the named job.
    async fn last_build_status(&self, job_name: &str) -> Result<BuildStatus>;
}

/// Build information as returned by the Jenkins JSON API
#[derive(Clone, Debug, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub building: bool,
    pub result: Option<String>,
}

impl From<BuildInfo> for BuildStatus {
    fn from(info: BuildInfo) -> Self {
        match info.result {
            Some(result) if !info.building => BuildStatus::Finished(result),
            _ => BuildStatus::Building,
        }
    }
}

/// A Jenkins server reached over its JSON API
pub struct JenkinsServer {
    client: reqwest::Client,
    url: String,
}

impl JenkinsServer {
    /// Creates a client for the Jenkins server at the given URL.
    pub fn new(url: &str) -> Result<JenkinsServer> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(JenkinsServer {
            client,
            url: url.trim_end_matches('/').to_owned(),
        })
    }

    fn last_build_url(&self, job_name: &str) -> String {
        format!(
            "{}/job/{}/lastBuild/api/json?tree=building,result",
            self.url, job_name
        )
    }
}

#[async_trait]
impl BuildServer for JenkinsServer {
    async fn last_build_status(&self, job_name: &str) -> Result<BuildStatus> {
        let response = self.client.get(self.last_build_url(job_name)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(BuildStatus::Missing);
        }

        let info: BuildInfo = response.error_for_status()?.json().await?;
        Ok(info.into())
    }
}

/// Waits until the last build of the named job succeeded.
///
/// A missing or running build keeps the wait pending. A build which
/// finished with any other result than `SUCCESS` fails immediately.
pub async fn assert_job_last_build_is_successful<S: BuildServer + ?Sized>(
    waiter: &ConvergenceWaiter,
    timeout: Duration,
    server: &S,
    job_name: &str,
) -> Result<()> {
    waiter
        .wait_for(
            &format!("last build of job [{}] to succeed", job_name),
            timeout,
            move || async move {
                match server.last_build_status(job_name).await? {
                    BuildStatus::Missing => Err(PollFailure::pending(format!(
                        "job [{}] has no build yet",
                        job_name
                    ))),
                    BuildStatus::Building => Err(PollFailure::pending(format!(
                        "last build of job [{}] is still running",
                        job_name
                    ))),
                    status if status.is_successful() => Ok(()),
                    BuildStatus::Finished(result) => Err(PollFailure::Fatal(Error::Assertion(
                        format!("Last build of job [{}] finished with [{}]", job_name, result),
                    ))),
                }
            },
        )
        .await?;

    info!(job = job_name, "Last build succeeded");
    Ok(())
}
