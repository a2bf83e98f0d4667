//! Adapters implementing the ports declared in `globetime-proto`.

pub mod openweather;

pub use openweather::OpenWeatherClient;
