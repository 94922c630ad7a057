use super::grid;
use super::{Connector, Locator, PageDriver, PageElement, SessionStatus};
use crate::config::{AppConfig, EnvironmentSpec, GridProvider};
use crate::error::DriverError;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Local ports tried when the configured WebDriver does not answer
const FALLBACK_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Map a fantoccini command error onto the crate's driver errors
fn map_cmd_error(error: CmdError, what: &str) -> DriverError {
    if error.is_no_such_element() {
        DriverError::NotFound(what.to_string())
    } else if matches!(error, CmdError::WaitTimeout) {
        DriverError::Timeout(what.to_string())
    } else {
        DriverError::Command(format!("{}: {}", what, error))
    }
}

/// Element handle backed by a WebDriver element reference
#[derive(Clone)]
pub struct WebElement {
    inner: Element,
}

#[async_trait]
impl PageElement for WebElement {
    async fn find_by_tag(&self, tag: &str) -> Result<Self, DriverError> {
        self.inner
            .find(fantoccini::Locator::Css(tag))
            .await
            .map(|inner| WebElement { inner })
            .map_err(|e| map_cmd_error(e, tag))
    }

    async fn text(&self) -> Result<String, DriverError> {
        self.inner.text().await.map_err(|e| map_cmd_error(e, "text"))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        // Properties come back resolved (absolute href/src); fall back to the raw attribute
        match self.inner.prop(name).await {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => self
                .inner
                .attr(name)
                .await
                .map_err(|e| map_cmd_error(e, name)),
            Err(e) => Err(map_cmd_error(e, name)),
        }
    }

    async fn click(&self) -> Result<(), DriverError> {
        self.inner.click().await.map_err(|e| map_cmd_error(e, "click"))
    }
}

/// A browser session opened through fantoccini
pub struct WebDriverSession {
    client: Client,
    provider: Option<GridProvider>,
}

impl WebDriverSession {
    pub fn new(client: Client, provider: Option<GridProvider>) -> Self {
        Self { client, provider }
    }
}

#[async_trait]
impl PageDriver for WebDriverSession {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| map_cmd_error(e, url))
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WebElement, DriverError> {
        let css = locator.to_css();
        let deadline = Instant::now() + timeout;
        loop {
            match self.client.find(fantoccini::Locator::Css(&css)).await {
                Ok(element) => {
                    // Present is not enough; the button must be rendered and enabled
                    let displayed = element.is_displayed().await.unwrap_or(false);
                    let enabled = element.is_enabled().await.unwrap_or(false);
                    if displayed && enabled {
                        return Ok(WebElement { inner: element });
                    }
                }
                Err(e) if e.is_no_such_element() => {}
                Err(e) => return Err(map_cmd_error(e, &locator.to_string())),
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(locator.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, DriverError> {
        let css = locator.to_css();
        self.client
            .wait()
            .at_most(timeout)
            .for_element(fantoccini::Locator::Css(&css))
            .await
            .map_err(|e| map_cmd_error(e, &locator.to_string()))?;

        let elements = self
            .client
            .find_all(fantoccini::Locator::Css(&css))
            .await
            .map_err(|e| map_cmd_error(e, &locator.to_string()))?;
        Ok(elements
            .into_iter()
            .map(|inner| WebElement { inner })
            .collect())
    }

    async fn execute(&self, script: &str) -> Result<(), DriverError> {
        self.client
            .execute(script, Vec::new())
            .await
            .map(|_| ())
            .map_err(|e| map_cmd_error(e, "execute"))
    }

    async fn report_status(&self, status: SessionStatus, reason: &str) -> Result<(), DriverError> {
        match self.provider {
            Some(provider) => {
                let script = grid::status_script(provider, status, reason);
                self.execute(&script).await
            }
            None => Ok(()),
        }
    }

    async fn close(self) -> Result<(), DriverError> {
        self.client
            .close()
            .await
            .map_err(|e| map_cmd_error(e, "close"))
    }
}

/// Opens sessions against the configured local WebDriver or remote grid
pub struct WebDriverConnector {
    config: Arc<AppConfig>,
}

impl WebDriverConnector {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    async fn connect_local(&self) -> Result<WebDriverSession, DriverError> {
        let caps = grid::local_capabilities(self.config.headless);
        let primary = self.config.webdriver_url.as_str();

        match open(primary, caps.clone()).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", primary);
                return Ok(WebDriverSession::new(client, None));
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", primary, e);
            }
        }

        for url in FALLBACK_URLS.iter() {
            if *url == primary {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = open(url, caps.clone()).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(WebDriverSession::new(client, None));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(DriverError::Session(format!(
            "no WebDriver server reachable at {} or fallbacks",
            primary
        )))
    }

    async fn connect_grid(&self, env: &EnvironmentSpec) -> Result<WebDriverSession, DriverError> {
        let grid_config = self
            .config
            .grid
            .as_ref()
            .ok_or_else(|| DriverError::Session("no grid configured".to_string()))?;
        let hub = grid_config
            .authenticated_hub_url()
            .map_err(|e| DriverError::Session(e.to_string()))?;
        let caps = grid::capabilities(grid_config, env);

        let client = open(&hub, caps)
            .await
            .map_err(|e| DriverError::Session(format!("{}: {}", env.label(), e)))?;
        ::log::info!("Grid session started for {}", env.label());
        Ok(WebDriverSession::new(client, Some(grid_config.provider)))
    }
}

async fn open(url: &str, caps: Map<String, Value>) -> Result<Client, String> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(caps);
    builder.connect(url).await.map_err(|e| e.to_string())
}

#[async_trait]
impl Connector for WebDriverConnector {
    type Driver = WebDriverSession;

    async fn connect(
        &self,
        environment: Option<&EnvironmentSpec>,
    ) -> Result<WebDriverSession, DriverError> {
        match environment {
            Some(env) => self.connect_grid(env).await,
            None => self.connect_local().await,
        }
    }
}
