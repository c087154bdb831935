//! Calendar service adapter: number of events booked on a day.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::PricingError;
use crate::traits::CalendarLoadProvider;

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://calendar-service-pl5m.onrender.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarClient {
    config: CalendarConfig,
    client: reqwest::blocking::Client,
}

impl CalendarClient {
    pub fn new(config: CalendarConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

#[derive(Debug, Deserialize)]
struct EventsCount {
    #[serde(default)]
    count: u32,
}

impl CalendarLoadProvider for CalendarClient {
    fn load_for(&self, date: NaiveDate) -> Result<u32, PricingError> {
        let url = format!("{}/events-count", self.config.base_url.trim_end_matches('/'));
        let body = self
            .client
            .get(url)
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<EventsCount>())?;

        Ok(body.count)
    }
}
