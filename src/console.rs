//! Steps of the Fabric8 Console CD pipeline scenario
//!
//! [`Fabric8Console`] owns the collaborators of one scenario run and
//! exposes the scenario steps as methods. [`TestFabric8Console`] is the
//! synchronous variant used by plain `#[test]` functions.

use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use thirtyfour::Key;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::assertions::NamespaceAssert;
use crate::browser::{wait_for_title, Browser, Locator, WebDriverBrowser};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::forge::{generate_name, NewProjectFormData, ProjectsPage};
use crate::jenkins::{assert_job_last_build_is_successful, BuildServer, JenkinsServer};
use crate::kube::{get_pod_env_var, Cluster, KubeCluster};
use crate::wait::ConvergenceWaiter;

pub const JENKINS: &str = "jenkins";
pub const NEXUS: &str = "nexus";
pub const GOGS: &str = "gogs";
pub const FABRIC8_CONSOLE: &str = "fabric8";
pub const FABRIC8_FORGE: &str = "fabric8-forge";

/// Replication controllers which make up the CD pipeline
pub const CD_PIPELINE_CONTROLLERS: [&str; 5] =
    [JENKINS, NEXUS, GOGS, FABRIC8_FORGE, FABRIC8_CONSOLE];

/// Environment variable of the forge pod containing the archetypes version
pub const ARCHETYPES_VERSION_ENV_VAR: &str = "FABRIC8_ARCHETYPES_VERSION";

/// Log line of the forge once its web server accepts requests
pub const FORGE_STARTED_MESSAGE: &str = "oejs.Server:main: Started";

pub const CAMEL_CDI_ARCHETYPE: &str = "io.fabric8.archetypes:cdi-camel-archetype";
pub const CANARY_RELEASE_PIPELINE: &str = "maven/CanaryReleaseAndStage.groovy";

pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);
pub const FORGE_STARTUP_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(20 * 60);

const CONSOLE_TITLE: &str = "OpenShift Web Console";

/// Poll interval of the login check, as fine as a WebDriver wait
const TITLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Collaborators of one run of the console scenario
pub struct Fabric8Console<C: Cluster, B: Browser> {
    config: Config,
    cluster: C,
    browser: B,
    waiter: ConvergenceWaiter,
}

impl Fabric8Console<KubeCluster, WebDriverBrowser> {
    /// Connects to the cluster and starts a browser session as configured.
    ///
    /// [`close`](Self::close) must be called to end the browser session.
    pub async fn connect(config: Config) -> Result<Self> {
        let cluster = KubeCluster::new().await?;
        let browser = WebDriverBrowser::connect(&config.webdriver_url).await?;
        Ok(Fabric8Console::new(config, cluster, browser))
    }
}

impl<C: Cluster, B: Browser> Fabric8Console<C, B> {
    pub fn new(config: Config, cluster: C, browser: B) -> Self {
        let waiter = ConvergenceWaiter::new(config.poll_interval);
        Fabric8Console {
            config,
            cluster,
            browser,
            waiter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    fn asserts(&self) -> NamespaceAssert<'_, C> {
        NamespaceAssert::new(&self.cluster, &self.config.namespace)
    }

    fn projects_page<'a>(&'a self, console_url: &'a str) -> ProjectsPage<'a, B> {
        ProjectsPage::new(
            &self.browser,
            &self.waiter,
            console_url,
            &self.config.gogs_user,
        )
    }

    /// Opens the login page of the console.
    pub async fn open_login_page(&self) -> Result<()> {
        self.browser.goto(&self.config.console_url).await
    }

    /// Logs in and waits until the console is shown.
    pub async fn log_in(&self, user: &str, password: &str) -> Result<()> {
        self.browser
            .send_keys(&Locator::id("inputUsername"), user)
            .await?;
        self.browser
            .send_keys(
                &Locator::id("inputPassword"),
                &(password + Key::Enter).to_string(),
            )
            .await?;

        let title_waiter = ConvergenceWaiter::new(TITLE_POLL_INTERVAL);
        wait_for_title(&self.browser, &title_waiter, CONSOLE_TITLE, LOGIN_TIMEOUT).await?;
        info!(user, "Logged in");
        Ok(())
    }

    /// Verifies that the CD pipeline is deployed and that the forge has
    /// started.
    pub async fn cd_pipeline_is_running(&self) -> Result<()> {
        let asserts = self.asserts();

        for name in CD_PIPELINE_CONTROLLERS.iter() {
            asserts.replication_controller(name).await?;
        }

        asserts.running_pods_for_service(FABRIC8_CONSOLE).await?;
        info!(namespace = asserts.namespace(), "CD pipeline is running");

        let asserts = &asserts;
        self.waiter
            .wait_for(
                &format!("[{}] to log [{}]", FABRIC8_FORGE, FORGE_STARTED_MESSAGE),
                FORGE_STARTUP_TIMEOUT,
                move || async move {
                    asserts
                        .replication_controller_logs_contain(FABRIC8_FORGE, FORGE_STARTED_MESSAGE)
                        .await
                },
            )
            .await?;
        info!("Forge is started");
        Ok(())
    }

    /// Creates a Camel CDI project and waits until its pipeline build
    /// succeeded on Jenkins.
    ///
    /// Returns the name of the Jenkins job.
    pub async fn create_camel_cdi_project(&self) -> Result<String> {
        self.create_camel_cdi_project_with(JenkinsServer::new).await
    }

    /// Like [`create_camel_cdi_project`](Self::create_camel_cdi_project)
    /// but the build server is created by `connect` from the Jenkins
    /// service URL.
    pub async fn create_camel_cdi_project_with<S, F>(&self, connect: F) -> Result<String>
    where
        S: BuildServer,
        F: FnOnce(&str) -> Result<S>,
    {
        let project_name = format!("p{}", generate_name());

        let forge_pod = self
            .asserts()
            .pod_for_replication_controller(FABRIC8_FORGE)
            .await?;
        let archetypes_version = archetypes_version(&forge_pod)?;
        info!(
            "The {} pod is using the fabric8 archetypes version {}",
            FABRIC8_FORGE, archetypes_version
        );

        let project = NewProjectFormData::new(
            project_name,
            format!("{}:{}", CAMEL_CDI_ARCHETYPE, archetypes_version),
            CANARY_RELEASE_PIPELINE,
        );
        let console_url = self
            .cluster
            .service_url(&self.config.namespace, FABRIC8_CONSOLE)
            .await
            .map_err(|error| error.in_step("Resolving the console URL"))?;
        let projects = self.projects_page(&console_url);
        projects
            .create_project(&project)
            .await
            .map_err(|error| error.in_step("Creating project"))?;

        let job_name = format!("{}-{}", projects.gogs_user_name(), project.named);
        let jenkins_url = self
            .cluster
            .service_url(&self.config.namespace, JENKINS)
            .await
            .map_err(|error| error.in_step("Resolving the Jenkins URL"))?;
        let jenkins = connect(&jenkins_url)
            .map_err(|error| error.in_step("Connecting to Jenkins"))?;

        assert_job_last_build_is_successful(&self.waiter, BUILD_TIMEOUT, &jenkins, &job_name)
            .await
            .map_err(|error| error.in_step("Awaiting the pipeline build"))?;

        Ok(job_name)
    }

    /// Ends the browser session.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await
    }
}

/// Returns the archetypes version configured in the forge pod.
pub fn archetypes_version(forge_pod: &Pod) -> Result<String> {
    get_pod_env_var(forge_pod, ARCHETYPES_VERSION_ENV_VAR)
        .filter(|version| !version.trim().is_empty())
        .ok_or_else(|| {
            Error::Environment(format!(
                "No value for ${} found in pod {}",
                ARCHETYPES_VERSION_ENV_VAR,
                forge_pod.name_any()
            ))
        })
}

/// A synchronous [`Fabric8Console`] for plain tests
///
/// Every step panics on failure. The browser session is closed when the
/// [`TestFabric8Console`] is dropped, also if a step panicked.
pub struct TestFabric8Console {
    runtime: Runtime,
    console: Option<Fabric8Console<KubeCluster, WebDriverBrowser>>,
}

impl TestFabric8Console {
    /// Creates a [`TestFabric8Console`] configured from the environment.
    pub fn new() -> TestFabric8Console {
        let runtime = Runtime::new().expect("Tokio runtime could not be created");
        let console = runtime.block_on(async {
            let config = Config::from_env().expect("Configuration is invalid");
            Fabric8Console::connect(config)
                .await
                .expect("Fabric8 console session could not be started")
        });
        TestFabric8Console {
            runtime,
            console: Some(console),
        }
    }

    fn console(&self) -> &Fabric8Console<KubeCluster, WebDriverBrowser> {
        self.console
            .as_ref()
            .expect("Fabric8 console session is closed")
    }

    pub fn config(&self) -> &Config {
        self.console().config()
    }

    /// Opens the login page of the console.
    pub fn open_login_page(&self) {
        self.runtime
            .block_on(self.console().open_login_page())
            .unwrap_or_else(|error| panic!("Login page could not be opened: {}", error))
    }

    /// Logs in and waits until the console is shown.
    pub fn log_in(&self, user: &str, password: &str) {
        self.runtime
            .block_on(self.console().log_in(user, password))
            .unwrap_or_else(|error| panic!("Login failed: {}", error))
    }

    /// Verifies that the CD pipeline is running.
    pub fn cd_pipeline_is_running(&self) {
        self.runtime
            .block_on(self.console().cd_pipeline_is_running())
            .unwrap_or_else(|error| panic!("CD pipeline is not running: {}", error))
    }

    /// Creates a Camel CDI project and waits for its successful build.
    pub fn create_camel_cdi_project(&self) -> String {
        self.runtime
            .block_on(self.console().create_camel_cdi_project())
            .unwrap_or_else(|error| panic!("Camel CDI project was not built: {}", error))
    }
}

impl Default for TestFabric8Console {
    fn default() -> Self {
        TestFabric8Console::new()
    }
}

impl Drop for TestFabric8Console {
    fn drop(&mut self) {
        if let Some(console) = self.console.take() {
            if let Err(error) = self.runtime.block_on(console.close()) {
                warn!(%error, "Browser session could not be closed");
            }
        }
    }
}
