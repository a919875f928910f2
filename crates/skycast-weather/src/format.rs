//! Display helpers: temperatures, wind, times and condition colors.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::types::Units;

/// Round half toward positive infinity (20.5 -> 21, -20.5 -> -20)
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// "21°C" / "70°F"
pub fn format_temperature(temp: f64, units: Units) -> String {
    format!("{}{}", round_half_up(temp) as i64, units.temperature_symbol())
}

/// "3.6 m/s" / "8.1 mph"
pub fn format_wind_speed(speed: f64, units: Units) -> String {
    format!("{:.1} {}", speed, units.speed_unit())
}

/// 8-point compass direction for a bearing in degrees
pub fn wind_direction(degrees: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = round_half_up(degrees.rem_euclid(360.0) / 45.0) as usize % DIRECTIONS.len();
    DIRECTIONS[index]
}

/// Whether `now` falls strictly between sunrise and sunset
pub fn is_daytime(now: i64, sunrise: i64, sunset: i64) -> bool {
    now > sunrise && now < sunset
}

/// "Sunday, 1 June 2025, 02:30 PM"
pub fn format_date_time(timestamp: i64, tz: Tz) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| {
        dt.with_timezone(&tz)
            .format("%A, %-d %B %Y, %I:%M %p")
            .to_string()
    })
}

/// "02:30 PM"
pub fn format_time(timestamp: i64, tz: Tz) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(&tz).format("%I:%M %p").to_string())
}

/// Background and text colors for a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub text: &'static str,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new("#3498db", "#2980b9", "#ecf0f1")
    }
}

impl Palette {
    const fn new(primary: &'static str, secondary: &'static str, text: &'static str) -> Self {
        Self {
            primary,
            secondary,
            text,
        }
    }
}

/// Colors for an OpenWeatherMap condition id
pub fn palette_for(condition_id: i32, daytime: bool) -> Palette {
    match condition_id {
        200..=299 => Palette::new("#2c3e50", "#34495e", "#ecf0f1"),
        300..=399 | 500..=599 => Palette::new("#3498db", "#2980b9", "#ecf0f1"),
        600..=699 => Palette::new("#ecf0f1", "#bdc3c7", "#2c3e50"),
        700..=799 => Palette::new("#95a5a6", "#7f8c8d", "#ecf0f1"),
        800 if daytime => Palette::new("#3498db", "#2ecc71", "#ecf0f1"),
        800 => Palette::new("#2c3e50", "#34495e", "#ecf0f1"),
        801..=i32::MAX if daytime => Palette::new("#95a5a6", "#7f8c8d", "#ecf0f1"),
        801..=i32::MAX => Palette::new("#34495e", "#2c3e50", "#ecf0f1"),
        _ => Palette::default(),
    }
}
