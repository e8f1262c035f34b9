//! Reverse geocoding against a Nominatim-style endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use terreno_core::geo::{Address, GeoPoint, ReverseGeocode};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = "terreno-field-app/0.1";

/// Reverse-geocoding client. The caller races `reverse` against its own
/// timeout budget; this client does not retry.
#[derive(Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Overrides the endpoint, e.g. for a self-hosted instance.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for NominatimClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReverseGeocode for NominatimClient {
    async fn reverse(&self, point: GeoPoint) -> Result<Address> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
            ])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("Reverse geocoding request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "Reverse geocoding failed: HTTP {}",
            response.status()
        );

        let payload: ReverseResponse = response
            .json()
            .await
            .context("Failed to parse reverse geocoding response")?;
        Ok(payload.into_address())
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    house_number: Option<String>,
    #[serde(default)]
    neighbourhood: Option<String>,
    #[serde(default)]
    suburb: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl ReverseResponse {
    fn into_address(self) -> Address {
        let Some(raw) = self.address else {
            return Address::default();
        };

        let street = match (raw.road, raw.house_number) {
            (Some(road), Some(number)) => Some(format!("{} {}", road, number)),
            (Some(road), None) => Some(road),
            (None, _) => None,
        };

        Address {
            street,
            neighborhood: raw.neighbourhood.or(raw.suburb),
            city: raw.city.or(raw.town).or(raw.village),
            region: raw.state.or(raw.region),
        }
    }
}
