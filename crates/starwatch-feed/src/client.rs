//! Client for the NASA NeoWs daily feed.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use starwatch_config::FeedConfig;
use tracing::{debug, warn};

use crate::error::FeedError;

/// One near-Earth object as returned by the feed.
///
/// Only the fields the page reads are typed; everything else is kept in
/// `extra` so the proxy passes objects through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearEarthObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter: Option<EstimatedDiameter>,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: bool,
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproach>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meters: Option<DiameterRange>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiameterRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_velocity: Option<RelativeVelocity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelativeVelocity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kilometers_per_hour: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    near_earth_objects: HashMap<String, Vec<NearEarthObject>>,
}

/// Fetches one day of near-Earth objects. One request per call, no retries.
#[derive(Clone)]
pub struct NeoFeedClient {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl NeoFeedClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.resolved_api_key(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn feed_url(&self) -> String {
        format!("{}/neo/rest/v1/feed", self.base_url)
    }

    /// Objects for today's UTC date.
    pub fn fetch_today(&self) -> Result<Vec<NearEarthObject>, FeedError> {
        self.fetch_for(chrono::Utc::now().date_naive())
    }

    /// Objects listed under `date`. A date missing from the response yields an empty list.
    pub fn fetch_for(&self, date: NaiveDate) -> Result<Vec<NearEarthObject>, FeedError> {
        let day = date.format("%Y-%m-%d").to_string();
        debug!(date = %day, url = %self.feed_url(), "Fetching near-Earth objects");

        let response = match self
            .agent
            .get(&self.feed_url())
            .query("start_date", &day)
            .query("end_date", &day)
            .query("api_key", &self.api_key)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let reason = response.status_text().to_string();
                warn!(status, %reason, "Upstream feed returned an error");
                return Err(FeedError::Upstream { status, reason });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FeedError::Transport(transport.to_string()));
            }
        };

        let mut feed: FeedResponse = response
            .into_json()
            .map_err(|e| FeedError::Decode(e.to_string()))?;
        let objects = feed.near_earth_objects.remove(&day).unwrap_or_default();
        debug!(count = objects.len(), "Feed decoded");
        Ok(objects)
    }
}
