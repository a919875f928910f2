use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use skycast_core::{Config, ConfigError, Units};
use skycast_services::{DisplayState, PreferenceStore, Preferences, WeatherSession, WeatherView};
use skycast_weather::format::{
    format_date_time, format_temperature, format_time, format_wind_speed, wind_direction,
};
use skycast_weather::{
    CacheStore, Coordinates, FixedLocation, ForecastCalendar, LocationProvider,
    UnavailableLocation, WeatherGateway,
};

#[derive(Parser)]
#[command(name = "skycast", version, about = "Current weather and a five-day forecast")]
struct Cli {
    /// Unit system to use (metric or imperial), saved for later runs
    #[arg(short, long, global = true)]
    units: Option<Units>,

    /// Without a command, shows the last searched city or the configured location
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Weather for a city
    City {
        /// City name, e.g. "London" or "Paris,FR"
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Weather at a latitude/longitude pair
    Coords {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Weather at the configured location
    Here,
    /// Suggest city names matching a partial query
    Suggest { query: String },
    /// List recent searches
    Recent,
    /// Switch between metric and imperial units
    Units,
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;
    let cli = Cli::parse();

    let (config, _) = Config::load_validated()?;
    if !config.weather.is_configured() {
        tracing::warn!(
            "{} Config file: {}",
            ConfigError::MissingApiKey.user_message(),
            config.config_dir.join("config.toml").display()
        );
    }

    let session = build_session(&config)?;
    if let Some(units) = cli.units {
        session.preferences().set_units(units)?;
    }

    match cli.command {
        Some(Commands::City { name }) => {
            session.search_city(&name.join(" ")).await;
        }
        Some(Commands::Coords { lat, lon }) => {
            session
                .search_coordinates(Coordinates::new(lat, lon))
                .await;
        }
        Some(Commands::Here) => {
            session.use_current_location().await;
        }
        Some(Commands::Suggest { query }) => {
            let results = session.suggest(&query).await.unwrap_or_default();
            if results.is_empty() {
                println!("No matching cities");
            }
            for city in results {
                println!("{}, {}", city.name, city.region_label());
            }
            return Ok(());
        }
        Some(Commands::Recent) => {
            for city in session.preferences().recent_searches() {
                println!("{}", city);
            }
            return Ok(());
        }
        Some(Commands::Units) => {
            let units = session.toggle_units().await?;
            println!("Units set to {}", units);
            return Ok(());
        }
        None => {
            session.restore().await;
        }
    }

    match session.state() {
        DisplayState::Ready(view) => render(&session, &view, &config),
        DisplayState::Failed(failure) => {
            anyhow::bail!("{}\n{}", failure.message, failure.detail)
        }
        DisplayState::Empty | DisplayState::Loading => {
            println!("Search for a city to see the weather, e.g. `skycast city London`");
        }
    }

    Ok(())
}

fn build_session(config: &Config) -> Result<WeatherSession> {
    let gateway = WeatherGateway::from_config(&config.weather, Arc::new(CacheStore::system()))?;

    let store = PreferenceStore::open(config.preferences_path())?;
    let prefs = Preferences::new(Arc::new(store), config.weather.default_units);

    let locator: Arc<dyn LocationProvider> = match config.location.coordinates() {
        Some((lat, lon)) => Arc::new(FixedLocation(Coordinates::new(lat, lon))),
        None => Arc::new(UnavailableLocation),
    };

    Ok(WeatherSession::new(gateway, prefs, locator)
        .with_calendar(ForecastCalendar::new(config.display.tz()))
        .with_location_timeout(Duration::from_secs(config.location.timeout_secs)))
}

fn render(session: &WeatherSession, view: &WeatherView, config: &Config) {
    let tz = config.display.tz();
    let current = &view.current;
    let units = view.units;

    match &current.sys.country {
        Some(country) => println!("{}, {}", current.name, country),
        None => println!("{}", current.name),
    }
    if let Some(observed) = format_date_time(current.dt, tz) {
        println!("{}", observed);
    }

    let condition = current.primary_condition();
    println!(
        "{}  {}",
        format_temperature(current.main.temp, units),
        condition.map(|c| c.description.as_str()).unwrap_or_default()
    );
    println!(
        "Feels like {}, humidity {}%, wind {} {}",
        format_temperature(current.main.feels_like, units),
        current.main.humidity,
        format_wind_speed(current.wind.speed, units),
        wind_direction(current.wind.deg)
    );
    if let (Some(rise), Some(set)) = (
        format_time(current.sys.sunrise, tz),
        format_time(current.sys.sunset, tz),
    ) {
        println!("Sunrise {}, sunset {}", rise, set);
    }
    if let Some(c) = condition {
        println!("Icon {}", session.gateway().icon_url(&c.icon));
    }

    println!();
    for day in &view.daily {
        println!(
            "{}  {:>6} / {:<6} {} ({}% rain)",
            day.day,
            format_temperature(day.temp_max, units),
            format_temperature(day.temp_min, units),
            day.description,
            (day.precipitation_chance * 100.0).round() as i64
        );
    }
}
