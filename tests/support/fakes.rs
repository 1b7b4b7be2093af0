//! In-memory collaborators of the console scenario

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use fabric8_console_tests::prelude::*;
use kube::ResourceExt;
use thirtyfour::error::no_such_element;

use super::resources::replication_controller;

/// Answer of a fake log request
#[derive(Clone, Debug)]
pub enum LogResponse {
    Text(String),
    /// The API server rejects the request with this status code.
    Status(u16),
}

impl LogResponse {
    pub fn text(text: &str) -> Self {
        LogResponse::Text(text.to_owned())
    }
}

/// Pops the next scripted answer; the last one is repeated forever.
fn next<T: Clone>(script: &mut VecDeque<T>) -> Option<T> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

pub fn api_error(code: u16) -> Error {
    Error::Kube(kube::Error::Api(kube::core::ErrorResponse {
        status: String::from("Failure"),
        message: format!("request failed with status {}", code),
        reason: String::from("BadRequest"),
        code,
    }))
}

/// A cluster whose state is set up by the test
#[derive(Default)]
pub struct FakeCluster {
    controllers: Vec<ReplicationController>,
    service_pods: HashMap<String, Vec<Pod>>,
    controller_pods: HashMap<String, Vec<Pod>>,
    service_urls: HashMap<String, String>,
    logs: Mutex<HashMap<String, VecDeque<LogResponse>>>,
    log_requests: AtomicUsize,
}

impl FakeCluster {
    pub fn new() -> Self {
        FakeCluster::default()
    }

    pub fn with_replication_controllers(mut self, names: &[&str]) -> Self {
        self.controllers
            .extend(names.iter().map(|name| replication_controller(name)));
        self
    }

    pub fn with_service_pod(mut self, service: &str, pod: Pod) -> Self {
        self.service_pods
            .entry(service.to_owned())
            .or_default()
            .push(pod);
        self
    }

    pub fn with_controller_pod(mut self, controller: &str, pod: Pod) -> Self {
        self.controller_pods
            .entry(controller.to_owned())
            .or_default()
            .push(pod);
        self
    }

    pub fn with_service_url(mut self, service: &str, url: &str) -> Self {
        self.service_urls
            .insert(service.to_owned(), url.to_owned());
        self
    }

    /// Scripts the answers to the log requests of the named pod.
    pub fn with_logs(self, pod_name: &str, responses: Vec<LogResponse>) -> Self {
        self.logs
            .lock()
            .unwrap()
            .insert(pod_name.to_owned(), responses.into());
        self
    }

    pub fn log_requests(&self) -> usize {
        self.log_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn find_replication_controller(
        &self,
        _namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicationController>> {
        Ok(self
            .controllers
            .iter()
            .find(|controller| controller.name_any() == name)
            .cloned())
    }

    async fn pods_for_service(&self, _namespace: &str, name: &str) -> Result<Vec<Pod>> {
        Ok(self.service_pods.get(name).cloned().unwrap_or_default())
    }

    async fn pods_for_replication_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<Pod>> {
        if self.find_replication_controller(namespace, name).await?.is_none() {
            return Err(Error::Assertion(format!(
                "Replication controller [{}] does not exist in namespace [{}]",
                name, namespace
            )));
        }
        Ok(self.controller_pods.get(name).cloned().unwrap_or_default())
    }

    async fn pod_logs(&self, _namespace: &str, pod_name: &str) -> Result<String> {
        self.log_requests.fetch_add(1, Ordering::SeqCst);

        let response = self
            .logs
            .lock()
            .unwrap()
            .get_mut(pod_name)
            .and_then(next)
            .unwrap_or_else(|| LogResponse::text(""));

        match response {
            LogResponse::Text(text) => Ok(text),
            LogResponse::Status(code) => Err(api_error(code)),
        }
    }

    async fn service_url(&self, namespace: &str, name: &str) -> Result<String> {
        self.service_urls.get(name).cloned().ok_or_else(|| {
            Error::Assertion(format!(
                "Service [{}] does not exist in namespace [{}]",
                name, namespace
            ))
        })
    }
}

/// A browser which records the performed actions
pub struct FakeBrowser {
    titles: Mutex<VecDeque<String>>,
    displayed: bool,
    missing: Option<Locator>,
    actions: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl FakeBrowser {
    /// Creates a browser whose page title is `title` and on which every
    /// element is displayed.
    pub fn new(title: &str) -> Self {
        FakeBrowser::with_titles(&[title])
    }

    /// Creates a browser which returns the given titles one after the
    /// other.
    pub fn with_titles(titles: &[&str]) -> Self {
        FakeBrowser {
            titles: Mutex::new(titles.iter().map(|title| title.to_string()).collect()),
            displayed: true,
            missing: None,
            actions: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Hides all elements.
    pub fn without_elements(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Lets typing into or clicking the located element fail as if it
    /// did not exist.
    pub fn without_element(mut self, locator: Locator) -> Self {
        self.missing = Some(locator);
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, action: String) {
        self.actions.lock().unwrap().push(action);
    }

    fn find(&self, locator: &Locator) -> Result<()> {
        if self.missing.as_ref() == Some(locator) {
            Err(no_such_element(format!("no element found at {}", locator)).into())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        Ok(())
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        self.find(locator)?;
        self.record(format!("type {} into {}", text, locator));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.find(locator)?;
        self.record(format!("click {}", locator));
        Ok(())
    }

    async fn is_displayed(&self, _locator: &Locator) -> Result<bool> {
        Ok(self.displayed)
    }

    async fn title(&self) -> Result<String> {
        Ok(next(&mut self.titles.lock().unwrap()).unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl<'a> Browser for &'a FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        (**self).goto(url).await
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        (**self).send_keys(locator, text).await
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        (**self).click(locator).await
    }

    async fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        (**self).is_displayed(locator).await
    }

    async fn title(&self) -> Result<String> {
        (**self).title().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

/// A build server which answers with scripted build states
pub struct FakeBuildServer {
    statuses: Mutex<VecDeque<BuildStatus>>,
    queried_jobs: Mutex<Vec<String>>,
}

impl FakeBuildServer {
    pub fn new(statuses: Vec<BuildStatus>) -> Self {
        FakeBuildServer {
            statuses: Mutex::new(statuses.into()),
            queried_jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn queried_jobs(&self) -> Vec<String> {
        self.queried_jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildServer for FakeBuildServer {
    async fn last_build_status(&self, job_name: &str) -> Result<BuildStatus> {
        self.queried_jobs.lock().unwrap().push(job_name.to_owned());
        Ok(next(&mut self.statuses.lock().unwrap()).unwrap_or(BuildStatus::Missing))
    }
}

#[async_trait]
impl<'a> BuildServer for &'a FakeBuildServer {
    async fn last_build_status(&self, job_name: &str) -> Result<BuildStatus> {
        (**self).last_build_status(job_name).await
    }
}
