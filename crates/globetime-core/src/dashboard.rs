use std::sync::Arc;
use std::time::Duration;

use globetime_proto::{
    config::{City, Config, ConfigValidationError},
    ports::weather::WeatherPort,
};
use log::info;

use crate::{
    ModuleContext,
    event_bus::{BusEvent, ModuleEvent},
    modules::{Module, ModuleError, clock::Clock, weather::Weather},
    view::{self, CityCell},
};

/// The time and weather display for a fixed set of cities.
///
/// Mounting starts the clock ticker and the weather fetch cycle; unmounting
/// (or dropping) stops both.
#[derive(Debug)]
pub struct Dashboard<P> {
    cities: Vec<City>,
    clock: Clock,
    weather: Weather<P>,
    mounted: bool,
}

impl<P> Dashboard<P>
where
    P: WeatherPort + 'static,
{
    pub fn new(cities: Vec<City>, clock_format: &str, weather_port: Option<Arc<P>>) -> Self {
        let names = cities.iter().map(|city| city.name.clone()).collect();

        Self {
            clock: Clock::new(cities.clone(), clock_format),
            weather: Weather::new(weather_port, names),
            cities,
            mounted: false,
        }
    }

    /// Build a dashboard from a loaded configuration.
    pub fn from_config(
        config: &Config,
        weather_port: Option<Arc<P>>,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;

        let refresh = config
            .weather
            .refresh_interval_minutes
            .map(|minutes| Duration::from_secs(minutes * 60));
        let mut dashboard = Self::new(config.cities()?, &config.clock.format, weather_port);
        dashboard.weather = dashboard.weather.with_refresh_interval(refresh);

        Ok(dashboard)
    }

    pub fn mount(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        self.clock.register(ctx)?;
        self.weather.register(ctx)?;
        self.mounted = true;
        info!("dashboard mounted with {} cities", self.cities.len());
        Ok(())
    }

    pub fn unmount(&mut self) {
        if self.mounted {
            self.clock.teardown();
            self.weather.teardown();
            self.mounted = false;
            info!("dashboard unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Apply a drained bus event. Returns `true` when the frame changed.
    pub fn handle(&mut self, event: BusEvent) -> bool {
        match event {
            BusEvent::Redraw => true,
            BusEvent::Module(ModuleEvent::Clock(message)) => {
                self.clock.update(message);
                true
            }
            BusEvent::Module(ModuleEvent::Weather(message)) => {
                self.weather.update(message);
                true
            }
        }
    }

    pub fn weather_loaded(&self) -> bool {
        self.weather.is_loaded()
    }

    pub fn cells(&self) -> Vec<CityCell> {
        view::project(&self.cities, self.clock.times(), self.weather.readings())
    }

    pub fn render(&self) -> String {
        view::render_text(&self.cells())
    }
}
