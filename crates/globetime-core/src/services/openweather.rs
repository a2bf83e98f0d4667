use std::time::Duration;

use globetime_proto::{
    config::{UnitSystem, WeatherModuleConfig},
    ports::weather::{WeatherError, WeatherPort, WeatherResponse},
};
use log::debug;
use masterror::{AppError, AppResult};

const USER_AGENT: &str = concat!("globetime/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeatherMap current-weather client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    units: UnitSystem,
}

impl OpenWeatherClient {
    /// Build a client from the weather section of the config.
    pub fn from_config(config: &WeatherModuleConfig, api_key: String) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(
            http,
            config.endpoint.clone(),
            api_key,
            config.units,
        ))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        units: UnitSystem,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            units,
        }
    }

    fn request(&self, city: &str) -> reqwest::RequestBuilder {
        self.http.get(&self.endpoint).query(&[
            ("q", city),
            ("units", self.units.as_query()),
            ("appid", self.api_key.as_str()),
        ])
    }
}

impl WeatherPort for OpenWeatherClient {
    /// The body is decoded whatever the HTTP status; the service reports
    /// failures through the `cod` field.
    async fn current_weather(&self, city: &str) -> Result<WeatherResponse, WeatherError> {
        let response = self.request(city).send().await.map_err(|e| {
            if e.is_timeout() {
                WeatherError::transport(city, "request timed out")
            } else if e.is_connect() {
                WeatherError::transport(city, format!("no connection: {e}"))
            } else {
                WeatherError::transport(city, e.to_string())
            }
        })?;

        let status = response.status();
        debug!("weather request for {city} returned HTTP {status}");

        let body = response
            .bytes()
            .await
            .map_err(|e| WeatherError::transport(city, format!("reading body: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| WeatherError::decode(city, format!("{e} (HTTP {status})")))
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::modules::weather::{Temperature, fetch_weather};

    fn client(endpoint: String) -> OpenWeatherClient {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("http client");

        OpenWeatherClient::with_http_client(http, endpoint, "test-key", UnitSystem::Imperial)
    }

    /// Serve a single canned HTTP response and return the endpoint URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 8192];
            let mut read = 0;

            loop {
                let n = socket.read(&mut buf[read..]).await.expect("read request");
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/data/2.5/weather")
    }

    #[test]
    fn request_carries_city_units_and_key() {
        let client = client("https://api.openweathermap.org/data/2.5/weather".into());
        let request = client.request("San Juan").build().expect("request");

        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/data/2.5/weather");
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "San Juan".to_string()),
                ("units".to_string(), "imperial".to_string()),
                ("appid".to_string(), "test-key".to_string()),
            ]
        );
    }

    #[test]
    fn from_config_uses_configured_units() {
        let config = WeatherModuleConfig {
            units: UnitSystem::Metric,
            ..WeatherModuleConfig::default()
        };
        let client = OpenWeatherClient::from_config(&config, "k".into()).expect("client");
        let request = client.request("Paris").build().expect("request");

        assert!(
            request
                .url()
                .query_pairs()
                .any(|(k, v)| k == "units" && v == "metric")
        );
    }

    #[tokio::test]
    async fn decodes_success_body() {
        let endpoint = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"cod":200,"main":{"temp":72.6},"weather":[{"main":"Clouds"}]}"#,
        )
        .await;

        let reading = fetch_weather(&client(endpoint), "Paris").await;

        assert_eq!(reading.temperature, Temperature::Degrees(73));
        assert_eq!(reading.condition, "Clouds");
    }

    #[tokio::test]
    async fn decodes_error_body_despite_http_status() {
        let endpoint = serve_once(
            "HTTP/1.1 404 Not Found",
            r#"{"cod":"404","message":"city not found"}"#,
        )
        .await;

        let response = client(endpoint)
            .current_weather("Atlantis")
            .await
            .expect("error body still decodes");

        assert!(!response.is_success());
        assert_eq!(response.message.as_deref(), Some("city not found"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let endpoint = serve_once("HTTP/1.1 502 Bad Gateway", "<html>bad gateway</html>").await;

        let err = client(endpoint)
            .current_weather("Tokyo")
            .await
            .expect_err("html is not a weather payload");

        assert!(matches!(err, WeatherError::Decode { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = client(format!("http://{addr}/data/2.5/weather"))
            .current_weather("Moscow")
            .await
            .expect_err("nothing listens");

        assert!(matches!(err, WeatherError::Transport { .. }));
    }
}
