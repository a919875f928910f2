//! Reduction of 3-hourly forecast samples into daily summaries.
//!
//! Samples are grouped by the calendar date of their timestamp in the
//! calendar's timezone. Each field of a [`DailyForecast`] follows a fixed
//! [`Accumulation`] rule: temperature extremes widen as samples arrive,
//! display fields keep whatever the first sample of the day reported.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::error::WeatherError;
use crate::types::{DailyForecast, ForecastItem};

/// Days kept after aggregation
pub const MAX_FORECAST_DAYS: usize = 5;

/// How a daily field combines a new sample with the running value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Keep the larger value
    KeepMax,
    /// Keep the smaller value
    KeepMin,
    /// Keep the value from the first sample of the day
    FirstWins,
}

impl Accumulation {
    pub fn merge<T: PartialOrd>(self, current: T, incoming: T) -> T {
        match self {
            Accumulation::KeepMax if incoming > current => incoming,
            Accumulation::KeepMin if incoming < current => incoming,
            _ => current,
        }
    }
}

pub const TEMP_MAX_RULE: Accumulation = Accumulation::KeepMax;
pub const TEMP_MIN_RULE: Accumulation = Accumulation::KeepMin;
pub const PRECIPITATION_RULE: Accumulation = Accumulation::KeepMax;
pub const DISPLAY_RULE: Accumulation = Accumulation::FirstWins;

/// Timezone that decides where one forecast day ends and the next begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastCalendar {
    pub timezone: Tz,
}

impl Default for ForecastCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl ForecastCalendar {
    pub fn utc() -> Self {
        Self {
            timezone: chrono_tz::UTC,
        }
    }

    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Calendar date of an epoch-second timestamp
    pub fn date_of(&self, timestamp: i64) -> Result<NaiveDate, WeatherError> {
        DateTime::from_timestamp(timestamp, 0)
            .map(|dt| dt.with_timezone(&self.timezone).date_naive())
            .ok_or_else(|| WeatherError::Malformed(format!("timestamp {timestamp} out of range")))
    }
}

/// Short English weekday name, independent of the system locale
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Reduce forecast samples into at most [`MAX_FORECAST_DAYS`] daily summaries,
/// in the order their dates first appear.
pub fn aggregate(
    items: &[ForecastItem],
    calendar: &ForecastCalendar,
) -> Result<Vec<DailyForecast>, WeatherError> {
    let mut days: Vec<DailyForecast> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for item in items {
        let date = calendar.date_of(item.dt)?;

        match index.get(&date) {
            Some(&i) => absorb(&mut days[i], item),
            None if days.len() < MAX_FORECAST_DAYS => {
                index.insert(date, days.len());
                days.push(seed(date, item)?);
            }
            // Beyond the fifth date; never seeded, never validated
            None => {}
        }
    }

    Ok(days)
}

fn seed(date: NaiveDate, item: &ForecastItem) -> Result<DailyForecast, WeatherError> {
    let condition = item.weather.first().ok_or_else(|| {
        WeatherError::Malformed(format!("forecast sample at {} has no condition", item.dt))
    })?;

    Ok(DailyForecast {
        date,
        day: weekday_label(date),
        temp_max: item.main.temp_max,
        temp_min: item.main.temp_min,
        description: condition.description.clone(),
        icon: condition.icon.clone(),
        precipitation_chance: item.pop,
    })
}

fn absorb(day: &mut DailyForecast, item: &ForecastItem) {
    day.temp_max = TEMP_MAX_RULE.merge(day.temp_max, item.main.temp_max);
    day.temp_min = TEMP_MIN_RULE.merge(day.temp_min, item.main.temp_min);
    day.precipitation_chance = PRECIPITATION_RULE.merge(day.precipitation_chance, item.pop);
    // description, icon and day stay as seeded (DISPLAY_RULE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Condition, MainReadings, Wind};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample(timestamp: i64, temp_max: f64, temp_min: f64, description: &str, icon: &str) -> ForecastItem {
        ForecastItem {
            dt: timestamp,
            main: MainReadings {
                temp: (temp_max + temp_min) / 2.0,
                feels_like: temp_min,
                temp_min,
                temp_max,
                pressure: 1012.0,
                humidity: 60.0,
            },
            weather: vec![Condition {
                id: 800,
                main: "Clear".into(),
                description: description.into(),
                icon: icon.into(),
            }],
            wind: Wind { speed: 2.0, deg: 180.0 },
            pop: 0.0,
            dt_txt: None,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp()
    }

    #[test]
    fn test_widen_extremes_and_keep_first_display_fields() {
        let items = vec![
            sample(at(2025, 6, 1, 0), 20.0, 10.0, "clear sky", "01d"),
            sample(at(2025, 6, 1, 3), 25.0, 12.0, "light rain", "10d"),
            sample(at(2025, 6, 1, 6), 18.0, 8.0, "overcast clouds", "04d"),
        ];

        let days = aggregate(&items, &ForecastCalendar::utc()).unwrap();
        assert_eq!(days.len(), 1);

        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(day.temp_max, 25.0);
        assert_eq!(day.temp_min, 8.0);
        assert_eq!(day.description, "clear sky");
        assert_eq!(day.icon, "01d");
        assert_eq!(day.day, "Sun");
    }

    #[test]
    fn test_truncates_to_first_five_dates() {
        let items: Vec<ForecastItem> = (1..=7)
            .flat_map(|d| {
                [0, 12].map(|h| sample(at(2025, 6, d, h), 20.0 + d as f64, 10.0, "clear sky", "01d"))
            })
            .collect();

        let days = aggregate(&items, &ForecastCalendar::utc()).unwrap();
        let dates: Vec<u32> = days.iter().map(|d| chrono::Datelike::day(&d.date)).collect();
        assert_eq!(dates, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_dates_past_the_fifth_are_not_inspected() {
        let mut items: Vec<ForecastItem> = (1..=5)
            .map(|d| sample(at(2025, 6, d, 12), 20.0, 10.0, "clear sky", "01d"))
            .collect();
        let mut bare = sample(at(2025, 6, 6, 12), 20.0, 10.0, "clear sky", "01d");
        bare.weather.clear();
        items.push(bare);

        let days = aggregate(&items, &ForecastCalendar::utc()).unwrap();
        assert_eq!(days.len(), MAX_FORECAST_DAYS);
    }

    #[test]
    fn test_weekday_labels_are_english_short_names() {
        let items: Vec<ForecastItem> = (2..=6)
            .map(|d| sample(at(2025, 6, d, 9), 20.0, 10.0, "clear sky", "01d"))
            .collect();

        let labels: Vec<String> = aggregate(&items, &ForecastCalendar::utc())
            .unwrap()
            .into_iter()
            .map(|d| d.day)
            .collect();
        assert_eq!(labels, vec!["Mon", "Tue", "Wed", "Thu", "Fri"]);
    }

    #[test]
    fn test_calendar_timezone_moves_day_boundary() {
        // 22:00 UTC on June 1st is already June 2nd in Tokyo
        let items = vec![
            sample(at(2025, 6, 1, 12), 20.0, 10.0, "clear sky", "01d"),
            sample(at(2025, 6, 1, 22), 15.0, 5.0, "mist", "50n"),
        ];

        let utc = aggregate(&items, &ForecastCalendar::utc()).unwrap();
        assert_eq!(utc.len(), 1);
        assert_eq!(utc[0].temp_min, 5.0);

        let tokyo = aggregate(&items, &ForecastCalendar::new(chrono_tz::Asia::Tokyo)).unwrap();
        assert_eq!(tokyo.len(), 2);
        assert_eq!(tokyo[1].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(tokyo[1].description, "mist");
    }

    #[test]
    fn test_precipitation_chance_keeps_max() {
        let mut wet = sample(at(2025, 6, 1, 3), 20.0, 10.0, "rain", "10d");
        wet.pop = 0.8;
        let items = vec![sample(at(2025, 6, 1, 0), 20.0, 10.0, "clear sky", "01d"), wet];

        let days = aggregate(&items, &ForecastCalendar::utc()).unwrap();
        assert_eq!(days[0].precipitation_chance, 0.8);
    }

    #[test]
    fn test_sample_without_condition_is_malformed() {
        let mut item = sample(at(2025, 6, 1, 0), 20.0, 10.0, "clear sky", "01d");
        item.weather.clear();

        let result = aggregate(&[item], &ForecastCalendar::utc());
        assert!(matches!(result, Err(WeatherError::Malformed(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], &ForecastCalendar::utc()).unwrap().is_empty());
    }

    #[test]
    fn test_accumulation_rules() {
        assert_eq!(Accumulation::KeepMax.merge(3.0, 5.0), 5.0);
        assert_eq!(Accumulation::KeepMax.merge(5.0, 3.0), 5.0);
        assert_eq!(Accumulation::KeepMin.merge(3.0, 5.0), 3.0);
        assert_eq!(Accumulation::KeepMin.merge(5.0, 3.0), 3.0);
        assert_eq!(Accumulation::FirstWins.merge("first", "second"), "first");
    }
}
