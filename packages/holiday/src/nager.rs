//! Nager.Date public holiday API client.
//!
//! One unauthenticated `GET` per year; no rate limit is documented.
//!
//! See <https://date.nager.at/Api>

use std::time::Duration;

use async_trait::async_trait;

use crate::{HolidayError, HolidaySource, RawHoliday};

/// Default API root; the year and country code are appended as path
/// segments.
pub const DEFAULT_BASE_URL: &str = "https://date.nager.at/api/v3/publicholidays";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`HolidaySource`] backed by the Nager.Date REST API.
pub struct NagerDateSource {
    client: reqwest::Client,
    base_url: String,
    country: String,
}

impl NagerDateSource {
    /// Creates a client for `country` (ISO 3166-1 alpha-2, e.g. `"US"`).
    ///
    /// # Errors
    ///
    /// Returns [`HolidayError`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, country: &str, timeout: Duration) -> Result<Self, HolidayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
        })
    }

    /// URL of the holiday list for one year.
    #[must_use]
    pub fn year_url(&self, year: i32) -> String {
        format!("{}/{year}/{}", self.base_url, self.country)
    }
}

#[async_trait]
impl HolidaySource for NagerDateSource {
    async fn fetch_year(&self, year: i32) -> Result<Vec<RawHoliday>, HolidayError> {
        let url = self.year_url(year);
        log::info!("Fetching holidays for {year} from {url}");

        let resp = self.client.get(&url).send().await?.error_for_status()?;

        // The API answers 204 No Content for years it does not cover.
        if resp.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body = resp.text().await?;
        parse_response(&body)
    }
}

/// Parses a Nager.Date year response body.
fn parse_response(body: &str) -> Result<Vec<RawHoliday>, HolidayError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}
