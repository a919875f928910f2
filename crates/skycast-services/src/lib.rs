//! Stateful services behind the SkyCast display: saved preferences and the
//! weather session that drives lookups.

pub mod prefs;
pub mod session;

pub use prefs::{
    PreferenceChange, PreferenceStore, Preferences, LAST_CITY_KEY, MAX_RECENT_SEARCHES,
    RECENT_SEARCHES_KEY, UNITS_KEY,
};
pub use session::{
    DisplayState, FailureView, LastRequest, Outcome, RetryTarget, WeatherSession, WeatherView,
};
