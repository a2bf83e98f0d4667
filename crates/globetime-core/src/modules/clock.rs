use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use globetime_proto::config::{City, DEFAULT_CLOCK_FORMAT};
use log::{debug, error, warn};
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    ModuleContext,
    event_bus::ModuleEvent,
    modules::{Module, ModuleError},
};

/// Period of the ticker task.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// City name to formatted local time. Replaced wholesale on every tick.
pub type TimeReadings = HashMap<String, String>;

/// Format `now` as wall-clock time in `timezone`.
///
/// A format chrono cannot render falls back to [`DEFAULT_CLOCK_FORMAT`].
pub fn format_local_time(now: DateTime<Utc>, timezone: Tz, format: &str) -> String {
    let local = now.with_timezone(&timezone);
    let mut formatted = String::new();

    if write!(formatted, "{}", local.format(format)).is_err() {
        warn!("Unrenderable clock format '{format}', using default");
        formatted.clear();
        let _ = write!(formatted, "{}", local.format(DEFAULT_CLOCK_FORMAT));
    }

    formatted
}

/// Compute the formatted local time of every city at the instant `now`.
pub fn snapshot(cities: &[City], format: &str, now: DateTime<Utc>) -> TimeReadings {
    cities
        .iter()
        .map(|city| {
            (
                city.name.clone(),
                format_local_time(now, city.timezone, format),
            )
        })
        .collect()
}

/// Message type for host communication
#[derive(Debug, Clone)]
pub enum Message {
    Tick(DateTime<Utc>),
}

/// Clock module: keeps the time map current while mounted.
#[derive(Debug)]
pub struct Clock {
    cities: Vec<City>,
    format: String,
    times: TimeReadings,
    task: Option<JoinHandle<()>>,
}

impl Clock {
    pub fn new(cities: Vec<City>, format: impl Into<String>) -> Self {
        Self {
            cities,
            format: format.into(),
            times: TimeReadings::new(),
            task: None,
        }
    }

    /// Current time map for rendering
    pub fn times(&self) -> &TimeReadings {
        &self.times
    }

    pub fn tick_interval(&self) -> Duration {
        TICK_INTERVAL
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Apply a message produced by the ticker task
    pub fn update(&mut self, message: Message) {
        match message {
            Message::Tick(now) => {
                self.times = snapshot(&self.cities, &self.format, now);
            }
        }
    }
}

impl Module for Clock {
    fn register(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        self.teardown();
        self.update(Message::Tick(Utc::now()));

        let sender = ctx.module_sender(ModuleEvent::Clock);
        let interval_duration = TICK_INTERVAL;

        self.task = Some(ctx.runtime_handle().spawn(async move {
            let mut ticker = interval(interval_duration);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately; mount already took the initial snapshot
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if let Err(err) = sender.try_send(Message::Tick(Utc::now())) {
                    error!("Failed to publish clock tick: {err}");
                }
            }
        }));

        debug!(
            "clock registered for {} cities, ticking every {:?}",
            self.cities.len(),
            interval_duration
        );
        ctx.request_redraw()?;
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.teardown();
    }
}
