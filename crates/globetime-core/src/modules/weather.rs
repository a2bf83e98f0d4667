use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use globetime_proto::ports::weather::{WeatherPort, WeatherResponse};
use log::{debug, error, info};
use serde_json::Value;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    ModuleContext, ModuleEventSender,
    event_bus::ModuleEvent,
    modules::{Module, ModuleError},
};

mod icon;

pub use icon::WeatherIcon;

/// Condition label used whenever the service gives none.
pub const DEFAULT_CONDITION: &str = "Default";

/// Temperature as displayed: a rounded reading or a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temperature {
    Degrees(i64),
    /// The service answered with a non-success `cod`.
    Error,
    /// The request or the response decoding failed.
    NetworkError,
    /// The service answered successfully but reported no temperature.
    Unavailable,
}

impl Temperature {
    /// Round to the nearest degree; ties go toward positive infinity.
    pub fn from_reading(temp: f64) -> Self {
        let floor = temp.floor();
        let degrees = if temp - floor >= 0.5 { floor + 1.0 } else { floor };

        Temperature::Degrees(degrees as i64)
    }

    pub fn degrees(&self) -> Option<i64> {
        match self {
            Temperature::Degrees(degrees) => Some(*degrees),
            _ => None,
        }
    }

    /// JSON form: a number for readings, the sentinel text otherwise.
    pub fn to_value(&self) -> Value {
        match self {
            Temperature::Degrees(degrees) => Value::from(*degrees),
            sentinel => Value::String(sentinel.to_string()),
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Degrees(degrees) => write!(f, "{degrees}"),
            Temperature::Error => f.write_str("Error"),
            Temperature::NetworkError => f.write_str("Network Error"),
            Temperature::Unavailable => f.write_str("N/A"),
        }
    }
}

/// Weather data for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReading {
    pub temperature: Temperature,
    pub condition: String,
}

impl WeatherReading {
    fn sentinel(temperature: Temperature) -> Self {
        Self {
            temperature,
            condition: DEFAULT_CONDITION.to_owned(),
        }
    }

    pub fn error() -> Self {
        Self::sentinel(Temperature::Error)
    }

    pub fn network_error() -> Self {
        Self::sentinel(Temperature::NetworkError)
    }

    /// Build a reading from a response whose `cod` reported success.
    pub fn from_response(response: &WeatherResponse) -> Self {
        let temperature = response
            .main
            .as_ref()
            .map(|main| Temperature::from_reading(main.temp))
            .unwrap_or(Temperature::Unavailable);

        Self {
            temperature,
            condition: response
                .condition()
                .unwrap_or(DEFAULT_CONDITION)
                .to_owned(),
        }
    }

    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::for_temperature(&self.temperature)
    }
}

/// City name to weather reading.
pub type WeatherReadings = HashMap<String, WeatherReading>;

/// Fetch the current weather for one city.
///
/// Never fails: application errors become [`Temperature::Error`] and
/// transport or decoding failures become [`Temperature::NetworkError`].
pub async fn fetch_weather<P>(port: &P, city: &str) -> WeatherReading
where
    P: WeatherPort,
{
    match port.current_weather(city).await {
        Ok(response) => {
            debug!("Weather data for {city}: {response:?}");

            if !response.is_success() {
                error!(
                    "API error for {city}: {}",
                    response.message.as_deref().unwrap_or("no message")
                );
                return WeatherReading::error();
            }

            WeatherReading::from_response(&response)
        }
        Err(err) => {
            error!("Error fetching weather for {city}: {err}");
            WeatherReading::network_error()
        }
    }
}

/// Fetch every city in order, one request at a time.
pub async fn fetch_all<P>(port: &P, cities: &[String]) -> WeatherReadings
where
    P: WeatherPort,
{
    let mut readings = WeatherReadings::with_capacity(cities.len());

    for city in cities {
        let reading = fetch_weather(port, city).await;
        readings.insert(city.clone(), reading);
    }

    readings
}

/// Readings used when no API key is configured.
pub fn unconfigured(cities: &[String]) -> WeatherReadings {
    cities
        .iter()
        .map(|city| (city.clone(), WeatherReading::error()))
        .collect()
}

/// Message type for host communication
#[derive(Debug, Clone)]
pub enum Message {
    Loaded(WeatherReadings),
}

/// Weather module: runs the fetch cycle on mount and holds its results.
#[derive(Debug)]
pub struct Weather<P> {
    port: Option<Arc<P>>,
    cities: Vec<String>,
    refresh_interval: Option<Duration>,
    readings: WeatherReadings,
    loaded: bool,
    task: Option<JoinHandle<()>>,
}

impl<P> Weather<P>
where
    P: WeatherPort + 'static,
{
    /// `port` is `None` when no API key could be resolved.
    pub fn new(port: Option<Arc<P>>, cities: Vec<String>) -> Self {
        Self {
            port,
            cities,
            refresh_interval: None,
            readings: WeatherReadings::new(),
            loaded: false,
            task: None,
        }
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Option<Duration>) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Get current readings for rendering
    pub fn readings(&self) -> &WeatherReadings {
        &self.readings
    }

    /// `true` once the first fetch cycle has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Update weather state from host message
    pub fn update(&mut self, message: Message) {
        match message {
            Message::Loaded(readings) => {
                info!("weather loaded for {} cities", readings.len());
                self.readings = readings;
                self.loaded = true;
            }
        }
    }

    fn spawn_cycle(
        ctx: &ModuleContext,
        port: Arc<P>,
        cities: Vec<String>,
        refresh_interval: Option<Duration>,
        sender: ModuleEventSender<Message>,
    ) -> JoinHandle<()> {
        ctx.runtime_handle().spawn(async move {
            let publish = |readings: WeatherReadings| {
                if let Err(err) = sender.try_send(Message::Loaded(readings)) {
                    error!("Failed to publish weather update: {err}");
                }
            };

            let Some(period) = refresh_interval else {
                publish(fetch_all(port.as_ref(), &cities).await);
                return;
            };

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                publish(fetch_all(port.as_ref(), &cities).await);
            }
        })
    }
}

impl<P> Module for Weather<P>
where
    P: WeatherPort + 'static,
{
    fn register(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        self.teardown();

        let Some(port) = self.port.clone() else {
            error!("Weather API key not configured; skipping weather requests");
            self.update(Message::Loaded(unconfigured(&self.cities)));
            ctx.request_redraw()?;
            return Ok(());
        };

        let sender = ctx.module_sender(ModuleEvent::Weather);
        self.task = Some(Self::spawn_cycle(
            ctx,
            port,
            self.cities.clone(),
            self.refresh_interval,
            sender,
        ));

        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<P> Drop for Weather<P> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
