//! Article extraction from the opinion listing page.

use crate::config::ExtractorConfig;
use crate::driver::{Locator, PageDriver, PageElement};
use crate::error::{DriverError, ExtractionError};
use crate::results::ArticleRecord;
use crate::utils::seconds;
use url::Url;

const ARTICLE_TAG: &str = "article";
const HEADING_TAG: &str = "h2";
const LINK_TAG: &str = "a";
const BODY_TAG: &str = "p";
const IMAGE_TAG: &str = "img";

/// Pulls up to `max_articles` article summaries off the listing page
pub struct Extractor<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a ExtractorConfig,
}

impl<'a, D: PageDriver> Extractor<'a, D> {
    pub fn new(driver: &'a D, config: &'a ExtractorConfig) -> Self {
        Self { driver, config }
    }

    /// Open the listing page and return records in document order.
    ///
    /// Blocks without a heading and inner link are skipped. Missing body
    /// text or image only leaves that field empty.
    pub async fn extract(&self) -> Result<Vec<ArticleRecord>, ExtractionError> {
        let url = &self.config.listing_url;
        ::log::info!("Opening listing page {}", url);
        self.driver
            .goto(url)
            .await
            .map_err(|source| ExtractionError::Navigation {
                url: url.clone(),
                source,
            })?;

        self.accept_consent().await;

        let blocks = match self
            .driver
            .wait_for_all(
                &Locator::tag(ARTICLE_TAG),
                seconds(self.config.article_timeout_secs),
            )
            .await
        {
            Ok(blocks) if !blocks.is_empty() => blocks,
            Ok(_) | Err(DriverError::Timeout(_)) | Err(DriverError::NotFound(_)) => {
                return Err(ExtractionError::Timeout {
                    url: url.clone(),
                    secs: self.config.article_timeout_secs,
                });
            }
            Err(e) => return Err(e.into()),
        };
        ::log::debug!("Found {} article blocks", blocks.len());

        let base = Url::parse(url).ok();
        let mut records = Vec::new();
        for (index, block) in blocks.iter().enumerate() {
            if records.len() == self.config.max_articles {
                break;
            }
            match read_block(block, base.as_ref()).await {
                Some(record) => records.push(record),
                None => ::log::warn!("Skipping article block {}: no heading link", index + 1),
            }
        }

        ::log::info!("Extracted {} articles from {}", records.len(), url);
        Ok(records)
    }

    /// Dismiss the consent overlay if it shows up in time
    async fn accept_consent(&self) {
        let locator = Locator::id(&self.config.consent_button_id);
        match self
            .driver
            .wait_for_clickable(&locator, seconds(self.config.consent_timeout_secs))
            .await
        {
            Ok(button) => match button.click().await {
                Ok(()) => ::log::debug!("Accepted consent prompt"),
                Err(e) => ::log::warn!("Consent button found but click failed: {}", e),
            },
            Err(DriverError::Timeout(_)) | Err(DriverError::NotFound(_)) => {
                ::log::debug!("No consent prompt within {}s", self.config.consent_timeout_secs);
            }
            Err(e) => ::log::warn!("Consent prompt check failed: {}", e),
        }
    }
}

/// Read one article block; `None` when the heading or its link is missing
async fn read_block<E: PageElement>(block: &E, base: Option<&Url>) -> Option<ArticleRecord> {
    let (title, link) = match read_header(block).await {
        Ok(pair) => pair,
        Err(e) => {
            if !e.is_not_found() {
                ::log::debug!("Header lookup failed: {}", e);
            }
            return None;
        }
    };
    let link = absolutize(&link, base);

    let content = match block.find_by_tag(BODY_TAG).await {
        Ok(paragraph) => optional_text(paragraph.text().await),
        Err(_) => None,
    };

    let image_url = match block.find_by_tag(IMAGE_TAG).await {
        Ok(img) => img
            .attribute("src")
            .await
            .ok()
            .flatten()
            .filter(|src| !src.is_empty())
            .map(|src| absolutize(&src, base)),
        Err(_) => None,
    };

    Some(ArticleRecord::new(title, link, content, image_url))
}

/// Heading text and link target are one capability: either both or neither
async fn read_header<E: PageElement>(block: &E) -> Result<(String, String), DriverError> {
    let heading = block.find_by_tag(HEADING_TAG).await?;
    let anchor = heading.find_by_tag(LINK_TAG).await?;
    let title = heading.text().await?;
    let link = anchor
        .attribute("href")
        .await?
        .filter(|href| !href.is_empty())
        .ok_or_else(|| DriverError::NotFound("href".to_string()))?;
    Ok((title, link))
}

fn optional_text(result: Result<String, DriverError>) -> Option<String> {
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            ::log::debug!("Could not read paragraph text: {}", e);
            None
        }
    }
}

/// Resolve a possibly relative reference against the listing page
fn absolutize(reference: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(reference).ok()) {
        Some(resolved) => resolved.to_string(),
        None => reference.to_string(),
    }
}
