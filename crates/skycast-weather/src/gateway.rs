//! OpenWeatherMap endpoints routed through the response cache.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use skycast_core::WeatherConfig;
use tracing::instrument;
use url::Url;

use crate::cache::CacheStore;
use crate::error::{TransportError, WeatherError};
use crate::fetch::{FetchClient, HttpFetchClient};
use crate::types::{AutocompleteResult, CurrentWeatherData, ForecastData, Units};

/// Queries shorter than this never reach the network
pub const MIN_SUGGEST_QUERY_LEN: usize = 3;

/// Maximum number of city suggestions requested and returned
pub const SUGGESTION_LIMIT: usize = 5;

/// Base URLs of the provider's APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoints {
    pub base_url: String,
    pub geo_url: String,
    pub icon_base_url: String,
}

impl Default for GatewayEndpoints {
    fn default() -> Self {
        Self::from_config(&WeatherConfig::default())
    }
}

impl GatewayEndpoints {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            geo_url: config.geo_url.clone(),
            icon_base_url: config.icon_base_url.clone(),
        }
    }

    /// Same host for every API, as used against a local mock server
    pub fn single_host(base: &str) -> Self {
        Self {
            base_url: base.to_string(),
            geo_url: base.to_string(),
            icon_base_url: base.to_string(),
        }
    }

    /// Image URL for a condition icon code such as "10d"
    pub fn icon_url(&self, code: &str) -> String {
        format!(
            "{}/img/wn/{}@2x.png",
            self.icon_base_url.trim_end_matches('/'),
            code
        )
    }
}

/// Weather lookups with a cache in front of the fetch client
pub struct WeatherGateway<F = HttpFetchClient> {
    fetcher: F,
    cache: Arc<CacheStore>,
    endpoints: GatewayEndpoints,
    api_key: String,
}

impl<F> std::fmt::Debug for WeatherGateway<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherGateway")
            .field("endpoints", &self.endpoints)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl WeatherGateway<HttpFetchClient> {
    /// Gateway using the HTTP client and endpoints from configuration
    pub fn from_config(
        config: &WeatherConfig,
        cache: Arc<CacheStore>,
    ) -> Result<Self, WeatherError> {
        let fetcher = HttpFetchClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(
            fetcher,
            cache,
            GatewayEndpoints::from_config(config),
            config.api_key.clone(),
        ))
    }
}

impl<F: FetchClient> WeatherGateway<F> {
    pub fn new(
        fetcher: F,
        cache: Arc<CacheStore>,
        endpoints: GatewayEndpoints,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            endpoints,
            api_key: api_key.into(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn endpoints(&self) -> &GatewayEndpoints {
        &self.endpoints
    }

    pub fn icon_url(&self, code: &str) -> String {
        self.endpoints.icon_url(code)
    }

    /// Current conditions for a city name
    #[instrument(skip(self), level = "info")]
    pub async fn current_by_name(
        &self,
        city: &str,
        units: Units,
    ) -> Result<CurrentWeatherData, WeatherError> {
        let url = self.endpoint(
            &self.endpoints.base_url,
            "weather",
            &[("q", city), ("appid", self.api_key.as_str()), ("units", units.as_str())],
        )?;
        self.fetch_typed(&url, &format!("current_q_{}_{}", city, units))
            .await
    }

    /// Current conditions at a coordinate pair
    #[instrument(skip(self), level = "info")]
    pub async fn current_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
    ) -> Result<CurrentWeatherData, WeatherError> {
        let (lat_s, lon_s) = (lat.to_string(), lon.to_string());
        let url = self.endpoint(
            &self.endpoints.base_url,
            "weather",
            &[
                ("lat", lat_s.as_str()),
                ("lon", lon_s.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ],
        )?;
        self.fetch_typed(&url, &format!("current_ll_{}_{}_{}", lat_s, lon_s, units))
            .await
    }

    /// 5-day / 3-hour forecast for a city name
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_by_name(
        &self,
        city: &str,
        units: Units,
    ) -> Result<ForecastData, WeatherError> {
        let url = self.endpoint(
            &self.endpoints.base_url,
            "forecast",
            &[("q", city), ("appid", self.api_key.as_str()), ("units", units.as_str())],
        )?;
        self.fetch_typed(&url, &format!("forecast_q_{}_{}", city, units))
            .await
    }

    /// 5-day / 3-hour forecast at a coordinate pair
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
    ) -> Result<ForecastData, WeatherError> {
        let (lat_s, lon_s) = (lat.to_string(), lon.to_string());
        let url = self.endpoint(
            &self.endpoints.base_url,
            "forecast",
            &[
                ("lat", lat_s.as_str()),
                ("lon", lon_s.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ],
        )?;
        self.fetch_typed(&url, &format!("forecast_ll_{}_{}_{}", lat_s, lon_s, units))
            .await
    }

    /// Up to five cities matching `query`.
    ///
    /// Short queries return nothing without a request. Failures are logged
    /// and reported as an empty list, so "no match" and "service down" look
    /// the same to the caller.
    #[instrument(skip(self), level = "debug")]
    pub async fn suggest_cities(&self, query: &str) -> Vec<AutocompleteResult> {
        if query.chars().count() < MIN_SUGGEST_QUERY_LEN {
            return Vec::new();
        }

        match self.lookup_suggestions(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Error fetching city suggestions: {}", e);
                Vec::new()
            }
        }
    }

    async fn lookup_suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<AutocompleteResult>, WeatherError> {
        let limit = SUGGESTION_LIMIT.to_string();
        let url = self.endpoint(
            &self.endpoints.geo_url,
            "direct",
            &[("q", query), ("limit", limit.as_str()), ("appid", self.api_key.as_str())],
        )?;

        let mut results: Vec<AutocompleteResult> = self
            .fetch_typed(&url, &format!("suggestions_{}", query))
            .await?;
        results.truncate(SUGGESTION_LIMIT);
        Ok(results)
    }

    fn endpoint(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, WeatherError> {
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn fetch_typed<T: DeserializeOwned>(&self, url: &Url, key: &str) -> Result<T, WeatherError> {
        let payload = self.fetch_with_cache(url, key).await?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn fetch_with_cache(&self, url: &Url, key: &str) -> Result<Value, TransportError> {
        if let Some(payload) = self.cache.get(key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(payload);
        }

        tracing::debug!("Cache miss for {}, fetching {}", key, url.path());
        let payload = self.fetcher.request(url).await.inspect_err(|e| {
            tracing::error!("Error fetching weather data: {}", e);
        })?;

        self.cache.put(key, payload.clone());
        Ok(payload)
    }
}
