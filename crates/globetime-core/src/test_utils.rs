use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use globetime_proto::ports::weather::{WeatherError, WeatherPort, WeatherResponse};

/// Scripted [`WeatherPort`] recording every request it receives.
///
/// Cities without a scripted answer fall back to the default response, or to
/// a transport error when none is set.
#[derive(Debug, Default)]
pub struct MockWeatherPort {
    responses: HashMap<String, Result<WeatherResponse, WeatherError>>,
    default_response: Option<WeatherResponse>,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockWeatherPort {
    fn decode(value: serde_json::Value) -> WeatherResponse {
        serde_json::from_value(value).expect("scripted response must decode")
    }

    pub fn with_json(mut self, city: &str, body: serde_json::Value) -> Self {
        self.responses
            .insert(city.to_owned(), Ok(Self::decode(body)));
        self
    }

    pub fn with_default_json(mut self, body: serde_json::Value) -> Self {
        self.default_response = Some(Self::decode(body));
        self
    }

    pub fn with_transport_error(mut self, city: &str) -> Self {
        self.responses.insert(
            city.to_owned(),
            Err(WeatherError::transport(city, "connection refused")),
        );
        self
    }

    pub fn with_decode_error(mut self, city: &str) -> Self {
        self.responses.insert(
            city.to_owned(),
            Err(WeatherError::decode(city, "expected value at line 1 column 1")),
        );
        self
    }

    /// Delay every answer, making overlapping requests observable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Cities requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned calls lock").clone()
    }

    /// Highest number of requests that were outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, city: &str) -> Result<WeatherResponse, WeatherError> {
        match self.responses.get(city) {
            Some(scripted) => scripted.clone(),
            None => self
                .default_response
                .clone()
                .ok_or_else(|| WeatherError::transport(city, "no scripted response")),
        }
    }
}

impl WeatherPort for MockWeatherPort {
    async fn current_weather(&self, city: &str) -> Result<WeatherResponse, WeatherError> {
        self.calls
            .lock()
            .expect("poisoned calls lock")
            .push(city.to_owned());

        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answer(city)
    }
}
