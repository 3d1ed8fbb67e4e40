//! [`Browser`] over a WebDriver session.
//!
//! Start a driver first, e.g. `chromedriver --port=4444`. The session runs a
//! headless Chromium with a fixed 1280x800 window. Each [`Page`] is a new tab
//! in the same session; closing it switches back to the tab that was active
//! when it was opened.

use super::{Browser, Page};
use crate::error::BrowserError;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::{TimeoutConfiguration, WindowHandle};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const CHROME_ARGS: [&str; 3] = ["--headless=new", "--no-sandbox", "--disable-gl-drawing-for-tests"];
const WINDOW_SIZE: (u32, u32) = (1280, 800);

/// Extra time the client-side guard allows on top of the driver's page-load
/// timeout before giving up on the command itself.
const NAVIGATION_GRACE: Duration = Duration::from_secs(5);

/// WebDriver key code for Enter.
const ENTER_KEY: &str = "\u{E007}";

const SCROLL_TO_END_JS: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) { return false; }
el.scrollTop = el.scrollHeight;
return true;
"#;

fn command(e: CmdError) -> BrowserError {
    BrowserError::Command(e.to_string())
}

/// Navigation failures, with the driver's page-load timeout reported as such.
fn navigation_error(url: &str, timeout: Duration, e: CmdError) -> BrowserError {
    let reason = if e.is_timeout() {
        format!("page load timed out after {timeout:?}")
    } else {
        e.to_string()
    };
    BrowserError::Navigation {
        url: url.to_string(),
        reason,
    }
}

fn lookup_error(selector: &str, timeout: Duration, e: CmdError) -> BrowserError {
    if matches!(e, CmdError::WaitTimeout) {
        BrowserError::Timeout {
            selector: selector.to_string(),
            timeout,
        }
    } else if e.is_no_such_element() {
        BrowserError::NoElement(selector.to_string())
    } else {
        command(e)
    }
}

/// A WebDriver session driving headless Chromium.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Connect to the WebDriver server at `webdriver_url` and start a session.
    #[instrument(level = "info")]
    pub async fn launch(webdriver_url: &str) -> Result<Self, BrowserError> {
        let mut caps = serde_json::Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": CHROME_ARGS }));

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        let client = builder
            .connect(webdriver_url)
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?;

        let (width, height) = WINDOW_SIZE;
        if let Err(e) = client.set_window_size(width, height).await {
            warn!(error = %e, "Could not resize browser window");
        }
        info!("Browser session started");
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        let opener = self.client.window().await.map_err(command)?;
        let tab = self.client.new_window(true).await.map_err(command)?;
        self.client
            .switch_to_window(tab.handle)
            .await
            .map_err(command)?;
        Ok(Box::new(WebDriverPage {
            client: self.client.clone(),
            opener: Some(opener),
        }))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.client.clone().close().await.map_err(command)?;
        info!("Browser session closed");
        Ok(())
    }
}

/// One tab of a [`WebDriverBrowser`] session.
pub struct WebDriverPage {
    client: Client,
    /// Tab to return to on close. `None` once closed.
    opener: Option<WindowHandle>,
}

#[async_trait]
impl Page for WebDriverPage {
    /// `timeout` is set as the session's page-load timeout before navigating,
    /// so the driver abandons a stuck page itself. The client-side timer only
    /// covers an unresponsive driver.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.client
            .update_timeouts(TimeoutConfiguration::new(None, Some(timeout), None))
            .await
            .map_err(command)?;
        match tokio::time::timeout(timeout + NAVIGATION_GRACE, self.client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(navigation_error(url, timeout, e)),
            Err(_) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("no response from driver after {:?}", timeout + NAVIGATION_GRACE),
            }),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .map(|_| ())
            .map_err(|e| lookup_error(selector, timeout, e))
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let field = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, Duration::ZERO, e))?;
        field.clear().await.map_err(command)?;
        field.send_keys(text).await.map_err(command)
    }

    async fn press_enter(&mut self, selector: &str) -> Result<(), BrowserError> {
        let field = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, Duration::ZERO, e))?;
        field.send_keys(ENTER_KEY).await.map_err(command)
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, Duration::ZERO, e))?;
        element.click().await.map_err(command)
    }

    async fn html(&mut self) -> Result<String, BrowserError> {
        self.client.source().await.map_err(command)
    }

    async fn attribute(
        &mut self,
        selector: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<String>, BrowserError> {
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, timeout, e))?;
        element.attr(name).await.map_err(command)
    }

    async fn scroll_to_end(&mut self, selector: &str) -> Result<(), BrowserError> {
        let found = self
            .client
            .execute(SCROLL_TO_END_JS, vec![json!(selector)])
            .await
            .map_err(command)?;
        match found.as_bool() {
            Some(true) => Ok(()),
            _ => Err(BrowserError::NoElement(selector.to_string())),
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let Some(opener) = self.opener.take() else {
            return Ok(());
        };
        self.client.close_window().await.map_err(command)?;
        self.client.switch_to_window(opener).await.map_err(command)?;
        debug!("Closed tab");
        Ok(())
    }
}
