//! Client for the remote JSON translation endpoint.

use crate::config::TranslatorConfig;
use crate::error::TranslationError;
use crate::results::TranslatedPair;
use crate::utils::{seconds, truncate_for_log};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    from: &'a str,
    to: &'a str,
    json: Fields<'a>,
}

#[derive(Debug, Serialize)]
struct Fields<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    trans: Option<TranslatedFields>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslatedFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Translates article title/content pairs, one request per call
pub struct Translator {
    client: reqwest::Client,
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(seconds(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Translate a title and optional body.
    ///
    /// Absent content is sent as an empty string. A 2xx reply missing `trans`
    /// or either field yields empty strings instead of an error.
    pub async fn translate(
        &self,
        title: &str,
        content: Option<&str>,
    ) -> Result<TranslatedPair, TranslationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(TranslationError::MissingCredential)?;

        let request = TranslateRequest {
            from: &self.config.source_lang,
            to: &self.config.target_lang,
            json: Fields {
                title,
                content: content.unwrap_or(""),
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.config.api_host)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranslationError::Status {
                status,
                body: truncate_for_log(&body, 200),
            });
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(TranslationError::Malformed)?;
        let trans = parsed.trans.unwrap_or_else(|| {
            ::log::warn!("Translation response had no `trans` object");
            TranslatedFields::default()
        });

        Ok(TranslatedPair {
            title_en: trans.title.unwrap_or_default(),
            content_en: trans.content.unwrap_or_default(),
        })
    }
}
