//! Page-automation seam.
//!
//! The extractor and coordinator only talk to these traits. The production
//! implementation lives in [`webdriver`] and drives a real browser over the
//! W3C WebDriver protocol; tests supply an in-memory page.

pub mod grid;
pub mod webdriver;

use crate::config::EnvironmentSpec;
use crate::error::DriverError;
use async_trait::async_trait;
use std::time::Duration;

/// How to find an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Tag(String),
    Css(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Locator::Tag(tag.into())
    }

    /// CSS selector equivalent, which every WebDriver accepts
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{}", id),
            Locator::Tag(tag) => tag.clone(),
            Locator::Css(css) => css.clone(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::Tag(tag) => write!(f, "tag={}", tag),
            Locator::Css(css) => write!(f, "css={}", css),
        }
    }
}

/// Outcome sent back to a hosting grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Passed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Passed => "passed",
            SessionStatus::Failed => "failed",
        }
    }
}

/// An element handle on the current page
#[async_trait]
pub trait PageElement: Sized + Send + Sync {
    /// First descendant with the given tag; `DriverError::NotFound` if none
    async fn find_by_tag(&self, tag: &str) -> Result<Self, DriverError>;

    /// Rendered text
    async fn text(&self) -> Result<String, DriverError>;

    /// Attribute value, resolved the way the browser exposes it
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    async fn click(&self) -> Result<(), DriverError>;
}

/// A live browser session
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: PageElement;

    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Wait up to `timeout` for an element to become available for clicking
    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Element, DriverError>;

    /// Wait up to `timeout` for at least one match, then return all matches in
    /// document order
    async fn wait_for_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, DriverError>;

    /// Run a script in the page
    async fn execute(&self, script: &str) -> Result<(), DriverError>;

    /// Tell the hosting grid how the run went. Local sessions ignore this.
    async fn report_status(
        &self,
        _status: SessionStatus,
        _reason: &str,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    /// End the session
    async fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Opens one session per pipeline run
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Driver: PageDriver + 'static;

    /// Connect to a local browser (`None`) or a grid environment
    async fn connect(
        &self,
        environment: Option<&EnvironmentSpec>,
    ) -> Result<Self::Driver, DriverError>;
}
