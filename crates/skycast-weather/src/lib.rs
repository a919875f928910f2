//! Weather lookup for SkyCast
//!
//! Fetches current conditions, forecasts and city suggestions from
//! OpenWeatherMap through a short-lived response cache, and reduces the
//! 3-hourly forecast into daily summaries.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod format;
pub mod gateway;
pub mod location;
pub mod sequence;
pub mod types;

pub use cache::{CacheStore, Clock, ManualClock, SystemClock, CACHE_TTL};
pub use error::{LocationError, TransportError, WeatherError};
pub use fetch::{FetchClient, HttpFetchClient};
pub use forecast::{aggregate, Accumulation, ForecastCalendar, MAX_FORECAST_DAYS};
pub use format::Palette;
pub use gateway::{GatewayEndpoints, WeatherGateway, MIN_SUGGEST_QUERY_LEN, SUGGESTION_LIMIT};
pub use location::{
    locate_with_timeout, FixedLocation, LocationProvider, UnavailableLocation, LOCATION_TIMEOUT,
};
pub use sequence::{DisplaySlot, RequestSequencer, RequestTicket};
pub use types::*;
