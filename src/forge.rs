//! Page objects of the forge project wizard

use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::browser::{wait_for_element, Browser, Locator};
use crate::error::Result;
use crate::wait::ConvergenceWaiter;

/// Time the wizard may take to generate the project and push it to Gogs
const PROJECT_CREATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Input of the new project wizard
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewProjectFormData {
    /// Name of the project
    pub named: String,
    /// Maven coordinates narrowing the archetype list to one entry
    pub archetype_filter: String,
    /// Path of the Jenkins pipeline script
    pub pipeline: String,
}

impl NewProjectFormData {
    pub fn new(
        named: impl Into<String>,
        archetype_filter: impl Into<String>,
        pipeline: impl Into<String>,
    ) -> Self {
        NewProjectFormData {
            named: named.into(),
            archetype_filter: archetype_filter.into(),
            pipeline: pipeline.into(),
        }
    }
}

/// Returns a short random name which is valid as a project and job name.
pub fn generate_name() -> String {
    let mut name = Uuid::new_v4().simple().to_string();
    name.truncate(8);
    name
}

/// The projects page of the console and its new project wizard
pub struct ProjectsPage<'a, B: Browser + ?Sized> {
    browser: &'a B,
    waiter: &'a ConvergenceWaiter,
    console_url: &'a str,
    gogs_user: &'a str,
}

impl<'a, B: Browser + ?Sized> ProjectsPage<'a, B> {
    pub fn new(
        browser: &'a B,
        waiter: &'a ConvergenceWaiter,
        console_url: &'a str,
        gogs_user: &'a str,
    ) -> Self {
        ProjectsPage {
            browser,
            waiter,
            console_url,
            gogs_user,
        }
    }

    /// Name of the Gogs user owning the created repositories
    pub fn gogs_user_name(&self) -> &str {
        self.gogs_user
    }

    /// URL of the new project wizard
    pub fn wizard_url(&self) -> String {
        format!(
            "{}/workspaces/{}/forge/command/project-new",
            self.console_url, self.gogs_user
        )
    }

    /// Runs the new project wizard and waits until the project is created.
    pub async fn create_project(&self, data: &NewProjectFormData) -> Result<()> {
        info!(project = %data.named, archetype = %data.archetype_filter, "Creating project");
        let next = Locator::id("next");

        self.browser.goto(&self.wizard_url()).await?;

        self.browser
            .send_keys(&Locator::id("named"), &data.named)
            .await?;
        self.browser.click(&next).await?;

        self.browser
            .send_keys(&Locator::id("archetype-filter"), &data.archetype_filter)
            .await?;
        self.browser
            .click(&Locator::link_text(data.archetype_filter.as_str()))
            .await?;
        self.browser.click(&next).await?;

        self.browser
            .send_keys(&Locator::id("pipeline-filter"), &data.pipeline)
            .await?;
        self.browser
            .click(&Locator::link_text(data.pipeline.as_str()))
            .await?;
        self.browser.click(&Locator::id("execute")).await?;

        wait_for_element(
            self.browser,
            self.waiter,
            &Locator::css(".project-created"),
            PROJECT_CREATION_TIMEOUT,
        )
        .await?;

        info!(project = %data.named, "Project created");
        Ok(())
    }
}
