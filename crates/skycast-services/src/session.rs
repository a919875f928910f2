//! Weather session: what the display shows and how it gets there.
//!
//! Each lookup takes a ticket for the conditions slot before fetching. When
//! a newer lookup starts before an older one finishes, the older result is
//! dropped instead of overwriting the display.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use skycast_core::{AppError, StorageError, Units};
use skycast_weather::format::palette_for;
use skycast_weather::{
    aggregate, locate_with_timeout, AutocompleteResult, Coordinates, CurrentWeatherData,
    DailyForecast, DisplaySlot, FetchClient, ForecastCalendar, HttpFetchClient, LocationError,
    LocationProvider, Palette, RequestSequencer, WeatherError, WeatherGateway, LOCATION_TIMEOUT,
};

use crate::prefs::Preferences;

const CITY_FAILURE: &str = "Could not fetch weather data for this city. Please try again.";
const LOCATION_FAILURE: &str =
    "Could not fetch weather data for your location. Please try searching for a city.";

/// What a lookup asked for
#[derive(Debug, Clone, PartialEq)]
pub enum LastRequest {
    City(String),
    Coordinates(Coordinates),
}

/// Everything needed to render a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub current: CurrentWeatherData,
    pub daily: Vec<DailyForecast>,
    pub units: Units,
    pub palette: Palette,
    pub source: LastRequest,
}

/// What `retry` will run again
#[derive(Debug, Clone, PartialEq)]
pub enum RetryTarget {
    Lookup(LastRequest),
    /// Locate the device, then look up its weather
    CurrentLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailureView {
    /// Generic message for the failed lookup
    pub message: String,
    /// Hint derived from the underlying error
    pub detail: String,
    /// What `retry` re-runs
    pub retry: Option<RetryTarget>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DisplayState {
    #[default]
    Empty,
    Loading,
    Ready(WeatherView),
    Failed(FailureView),
}

/// Whether a finished lookup reached the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Superseded,
}

#[derive(Debug, Default)]
struct SessionState {
    display: DisplayState,
    last_attempt: Option<RetryTarget>,
    last_success: Option<LastRequest>,
}

pub struct WeatherSession<F = HttpFetchClient> {
    gateway: WeatherGateway<F>,
    prefs: Preferences,
    sequencer: RequestSequencer,
    locator: Arc<dyn LocationProvider>,
    location_timeout: Duration,
    calendar: ForecastCalendar,
    state: Mutex<SessionState>,
}

impl<F: FetchClient> WeatherSession<F> {
    pub fn new(
        gateway: WeatherGateway<F>,
        prefs: Preferences,
        locator: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            gateway,
            prefs,
            sequencer: RequestSequencer::new(),
            locator,
            location_timeout: LOCATION_TIMEOUT,
            calendar: ForecastCalendar::utc(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Timezone used to split the forecast into days
    pub fn with_calendar(mut self, calendar: ForecastCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn gateway(&self) -> &WeatherGateway<F> {
        &self.gateway
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn state(&self) -> DisplayState {
        self.state.lock().display.clone()
    }

    pub fn units(&self) -> Units {
        self.prefs.units()
    }

    pub async fn search_city(&self, city: &str) -> Outcome {
        self.load(LastRequest::City(city.to_string())).await
    }

    pub async fn search_coordinates(&self, coords: Coordinates) -> Outcome {
        self.load(LastRequest::Coordinates(coords)).await
    }

    /// Look up the device position, then its weather
    pub async fn use_current_location(&self) -> Outcome {
        self.locate_and_load(true).await
    }

    /// Flip and save the unit system, then reload the last place that
    /// loaded successfully, even if a later lookup failed
    pub async fn toggle_units(&self) -> Result<Units, StorageError> {
        let units = self.prefs.units().toggled();
        self.prefs.set_units(units)?;
        tracing::info!("Switched to {} units", units);

        let reload = self.state.lock().last_success.clone();
        if let Some(request) = reload {
            self.load(request).await;
        }
        Ok(units)
    }

    /// Re-run the last attempt, the same target a failure view reports
    pub async fn retry(&self) -> Option<Outcome> {
        let target = self.state.lock().last_attempt.clone()?;
        let outcome = match target {
            RetryTarget::Lookup(request) => self.load(request).await,
            RetryTarget::CurrentLocation => self.locate_and_load(true).await,
        };
        Some(outcome)
    }

    /// Startup: the last searched city, else the current location.
    /// A failed location lookup here leaves the display empty.
    pub async fn restore(&self) -> Outcome {
        match self.prefs.last_city() {
            Some(city) => self.search_city(&city).await,
            None => self.locate_and_load(false).await,
        }
    }

    /// City suggestions, or `None` if a newer query replaced this one
    pub async fn suggest(&self, query: &str) -> Option<Vec<AutocompleteResult>> {
        let ticket = self.sequencer.issue(DisplaySlot::Suggestions);
        let results = self.gateway.suggest_cities(query).await;
        self.sequencer.is_current(&ticket).then_some(results)
    }

    async fn locate_and_load(&self, report_failure: bool) -> Outcome {
        let ticket = self.sequencer.issue(DisplaySlot::Conditions);
        self.state.lock().last_attempt = Some(RetryTarget::CurrentLocation);
        let located = locate_with_timeout(self.locator.as_ref(), self.location_timeout).await;

        if !self.sequencer.is_current(&ticket) {
            return Outcome::Superseded;
        }

        match located {
            Ok(coords) => self.search_coordinates(coords).await,
            Err(e) if report_failure => {
                self.state.lock().display = DisplayState::Failed(location_failure(e));
                Outcome::Applied
            }
            Err(_) => Outcome::Applied,
        }
    }

    async fn load(&self, request: LastRequest) -> Outcome {
        let ticket = self.sequencer.issue(DisplaySlot::Conditions);
        let units = self.prefs.units();
        {
            let mut state = self.state.lock();
            state.display = DisplayState::Loading;
            state.last_attempt = Some(RetryTarget::Lookup(request.clone()));
        }

        let result = self.fetch_view(&request, units).await;

        if !self.sequencer.is_current(&ticket) {
            tracing::debug!(
                "Discarding superseded response #{} for {:?}",
                ticket.sequence,
                request
            );
            return Outcome::Superseded;
        }

        match result {
            Ok(view) => {
                self.remember(&request, &view.current);
                let mut state = self.state.lock();
                state.display = DisplayState::Ready(view);
                state.last_success = Some(request);
            }
            Err(e) => {
                tracing::error!("Error fetching weather: {}", e);
                self.state.lock().display = DisplayState::Failed(lookup_failure(request, e));
            }
        }
        Outcome::Applied
    }

    async fn fetch_view(
        &self,
        request: &LastRequest,
        units: Units,
    ) -> Result<WeatherView, WeatherError> {
        let (current, forecast) = match request {
            LastRequest::City(city) => tokio::try_join!(
                self.gateway.current_by_name(city, units),
                self.gateway.forecast_by_name(city, units),
            )?,
            LastRequest::Coordinates(c) => tokio::try_join!(
                self.gateway.current_by_coordinates(c.lat, c.lon, units),
                self.gateway.forecast_by_coordinates(c.lat, c.lon, units),
            )?,
        };

        let daily = aggregate(&forecast.list, &self.calendar)?;
        let palette = current
            .primary_condition()
            .map(|c| palette_for(c.id, current.is_daytime()))
            .unwrap_or_default();

        Ok(WeatherView {
            current,
            daily,
            units,
            palette,
            source: request.clone(),
        })
    }

    /// Save the shown place as the latest search
    fn remember(&self, request: &LastRequest, current: &CurrentWeatherData) {
        let name = match request {
            LastRequest::City(city) => city.as_str(),
            LastRequest::Coordinates(_) => current.name.as_str(),
        };
        if name.is_empty() {
            return;
        }

        if let Err(e) = self.prefs.record_search(name) {
            tracing::warn!("Failed to save recent search: {}", e);
        }
        if let Err(e) = self.prefs.set_last_city(name) {
            tracing::warn!("Failed to save last city: {}", e);
        }
    }
}

fn lookup_failure(request: LastRequest, error: WeatherError) -> FailureView {
    let message = match request {
        LastRequest::City(_) => CITY_FAILURE,
        LastRequest::Coordinates(_) => LOCATION_FAILURE,
    };

    FailureView {
        message: message.to_string(),
        detail: AppError::from(error).user_message().to_string(),
        retry: Some(RetryTarget::Lookup(request)),
    }
}

fn location_failure(error: LocationError) -> FailureView {
    FailureView {
        message: error.to_string(),
        detail: AppError::from(error).user_message().to_string(),
        retry: Some(RetryTarget::CurrentLocation),
    }
}
