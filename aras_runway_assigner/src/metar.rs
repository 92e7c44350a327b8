use std::time::Duration;

use tracing::{debug, error, warn};

use crate::{
    error::{ApplicationError, ApplicationResult},
    wind::{WindObservation, WindSource, wind_from_metar},
};

const RETRIES: u32 = 3;

/// Reads wind from the METAR published for each airport.
#[derive(Debug, Clone)]
pub struct MetarWindSource {
    client: reqwest::Client,
    base_url: String,
}

impl MetarWindSource {
    /// `fetch_timeout` bounds one whole `fetch_wind` call and is shared out
    /// between the attempts.
    pub fn new(base_url: &str, fetch_timeout: Duration) -> ApplicationResult<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(attempt_timeout(fetch_timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, icao: &str) -> String {
        format!("{}/{}", self.base_url, icao)
    }

    #[tracing::instrument(skip(self))]
    async fn get_metar_text(&self, url: &str) -> ApplicationResult<String> {
        let mut first_error: Option<ApplicationError> = None;
        for attempt in 1..=RETRIES {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);

            let err = match resp {
                Ok(resp) => match resp.text().await {
                    Ok(text) => return Ok(text),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            if attempt == RETRIES {
                error!(attempt, "Failed to get {}: {}", url, err);
            } else {
                warn!(attempt, "Failed to get {}: {}", url, err);
            }
            first_error.get_or_insert(err.into());
        }
        Err(first_error.unwrap_or_else(|| ApplicationError::MetarParseError(url.to_string())))
    }
}

fn attempt_timeout(fetch_timeout: Duration) -> Duration {
    fetch_timeout / RETRIES
}

/// The METAR line for `icao` in a response body. Empty when there is none.
fn metar_line<'a>(text: &'a str, icao: &str) -> &'a str {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with(icao))
        .unwrap_or_default()
}

impl WindSource for MetarWindSource {
    async fn fetch_wind(&self, icao: &str) -> ApplicationResult<WindObservation> {
        let text = self.get_metar_text(&self.url_for(icao)).await?;
        let metar = metar_line(&text, icao);
        debug!(airport = icao, metar, "Received METAR");
        wind_from_metar(metar)
    }
}
