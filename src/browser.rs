//! Browser sessions driving the web console

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use thirtyfour::TimeoutConfiguration;
use tracing::info;

use crate::error::Result;
use crate::wait::{ConvergenceWaiter, PollFailure};

/// Time the WebDriver server searches for an element before it gives up
const IMPLICIT_WAIT: Duration = Duration::from_millis(2000);

/// Strategy for locating an element on the current page
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Locator {
    Id(String),
    Css(String),
    LinkText(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Locator::LinkText(text.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::Css(selector) => write!(f, "css={}", selector),
            Locator::LinkText(text) => write!(f, "link={}", text),
        }
    }
}

/// An open browser session
#[async_trait]
pub trait Browser: Send + Sync {
    /// Navigates to the given URL.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Types the given text into the located element.
    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Clicks the located element.
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Returns true if the located element exists and is displayed.
    async fn is_displayed(&self, locator: &Locator) -> Result<bool>;

    /// Returns the title of the current page.
    async fn title(&self) -> Result<String>;

    /// Ends the session.
    async fn close(&self) -> Result<()>;
}

/// Waits until the page title contains `substring`.
pub async fn wait_for_title<B: Browser + ?Sized>(
    browser: &B,
    waiter: &ConvergenceWaiter,
    substring: &str,
    timeout: Duration,
) -> Result<()> {
    waiter
        .wait_for(
            &format!("page title to contain [{}]", substring),
            timeout,
            move || async move {
                let title = browser.title().await?;
                if title.contains(substring) {
                    Ok(())
                } else {
                    Err(PollFailure::pending(format!("page title is [{}]", title)))
                }
            },
        )
        .await
}

/// Waits until the located element is displayed.
pub async fn wait_for_element<B: Browser + ?Sized>(
    browser: &B,
    waiter: &ConvergenceWaiter,
    locator: &Locator,
    timeout: Duration,
) -> Result<()> {
    waiter
        .wait_for(
            &format!("element [{}] to be displayed", locator),
            timeout,
            move || async move {
                if browser.is_displayed(locator).await? {
                    Ok(())
                } else {
                    Err(PollFailure::pending(format!("element [{}] is not displayed", locator)))
                }
            },
        )
        .await
}

/// A [`Browser`] controlled over the WebDriver protocol
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Starts a Chrome session on the given WebDriver server.
    pub async fn connect(webdriver_url: &str) -> Result<WebDriverBrowser> {
        let capabilities = DesiredCapabilities::chrome();
        let driver = WebDriver::new(webdriver_url, capabilities).await?;

        // The console renders lazily, so elements are searched for a while
        // before a lookup fails.
        let timeouts = TimeoutConfiguration::new(None, None, Some(IMPLICIT_WAIT));
        driver.update_timeouts(timeouts).await?;

        info!(webdriver_url, "Browser session started");
        Ok(WebDriverBrowser { driver })
    }

    async fn find(&self, locator: &Locator) -> Result<WebElement> {
        Ok(self.driver.find(to_by(locator)).await?)
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Id(id) => By::Id(id.as_str()),
        Locator::Css(selector) => By::Css(selector.as_str()),
        Locator::LinkText(text) => By::LinkText(text.as_str()),
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        Ok(self.driver.goto(url).await?)
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        Ok(self.find(locator).await?.send_keys(text).await?)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        Ok(self.find(locator).await?.click().await?)
    }

    async fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        let elements = self.driver.find_all(to_by(locator)).await?;
        match elements.first() {
            Some(element) => Ok(element.is_displayed().await?),
            None => Ok(false),
        }
    }

    async fn title(&self) -> Result<String> {
        Ok(self.driver.title().await?)
    }

    async fn close(&self) -> Result<()> {
        self.driver.clone().quit().await?;
        info!("Browser session closed");
        Ok(())
    }
}
