use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use skycast_core::Units;

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One weather condition as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Temperature and atmosphere readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    #[serde(default)]
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Current conditions for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherData {
    pub coord: Coordinates,
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    pub wind: Wind,
    pub sys: SunTimes,
    /// Observation time, epoch seconds
    pub dt: i64,
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl CurrentWeatherData {
    /// The first reported condition, which the provider lists as primary
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn is_daytime(&self) -> bool {
        crate::format::is_daytime(self.dt, self.sys.sunrise, self.sys.sunset)
    }
}

/// One 3-hour forecast sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    pub wind: Wind,
    /// Probability of precipitation, 0.0 to 1.0
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub dt_txt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Raw 5-day / 3-hour forecast payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    pub list: Vec<ForecastItem>,
    #[serde(default)]
    pub city: Option<ForecastCity>,
}

/// One calendar day reduced from forecast samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Short English weekday ("Mon")
    pub day: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub description: String,
    pub icon: String,
    /// Highest probability of precipitation seen that day
    pub precipitation_chance: f64,
}

/// City suggestion from the geocoding endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteResult {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl AutocompleteResult {
    /// "State, CC" or just "CC"
    pub fn region_label(&self) -> String {
        match &self.state {
            Some(state) if !state.is_empty() => format!("{}, {}", state, self.country),
            _ => self.country.clone(),
        }
    }
}
