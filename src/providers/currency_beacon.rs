use super::util::with_retry;
use crate::core::config::ProviderConfig;
use crate::core::currency::{ConversionQuote, Currency, CurrencyRateProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, instrument};

/// Client for the CurrencyBeacon v1 REST API.
pub struct CurrencyBeaconProvider {
    base_url: String,
    api_key: String,
    retries: usize,
    retry_delay_ms: u64,
    client: reqwest::Client,
}

impl CurrencyBeaconProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retries: 1,
            retry_delay_ms: 500,
            client,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let mut provider = Self::new(&config.base_url, &config.resolved_api_key())?;
        provider.retries = config.retries;
        provider.retry_delay_ms = config.retry_delay_ms;
        Ok(provider)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let params = std::iter::once(("api_key", self.api_key.as_str())).chain(query.iter().copied());
        let request_url = reqwest::Url::parse_with_params(&url, params)
            .with_context(|| format!("Invalid provider URL: {url}"))?;
        debug!("Requesting {}", url);
        with_retry(
            || self.client.get(request_url.clone()).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .with_context(|| format!("Request error for {url}"))
    }
}

#[derive(Debug, Deserialize)]
struct BeaconEnvelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct BeaconCurrency {
    id: u64,
    short_code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct BeaconConversion {
    from: String,
    to: String,
    amount: f64,
    value: f64,
}

#[async_trait]
impl CurrencyRateProvider for CurrencyBeaconProvider {
    #[instrument(name = "BeaconCurrencies", skip(self))]
    async fn fetch_currencies(&self) -> Result<Vec<Currency>> {
        let response = self.get("/currencies", &[]).await?;

        if !response.status().is_success() {
            error!(status = %response.status(), "Currency list response not ok");
            return Err(anyhow!("Failed to fetch currencies: {}", response.status()));
        }

        let text = response.text().await?;
        let data: BeaconEnvelope<Vec<BeaconCurrency>> = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse currency list response: {}", e))?;

        let mut currencies: Vec<Currency> = data
            .response
            .into_iter()
            .map(|c| Currency {
                id: c.id,
                short_code: c.short_code,
                name: c.name,
            })
            .collect();
        currencies.sort_by(|a, b| a.short_code.cmp(&b.short_code));
        Ok(currencies)
    }

    #[instrument(
        name = "BeaconConvert",
        skip(self),
        fields(from = %from, to = %to, amount = %amount)
    )]
    async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote> {
        let amount_param = amount.to_string();
        let response = self
            .get(
                "/convert",
                &[("from", from), ("to", to), ("amount", &amount_param)],
            )
            .await?;

        if !response.status().is_success() {
            error!(status = %response.status(), "Conversion response not ok");
            return Err(anyhow!("Conversion failed: {}", response.status()));
        }

        let text = response.text().await?;
        let data: BeaconEnvelope<BeaconConversion> = serde_json::from_str(&text).map_err(|e| {
            anyhow!(
                "Failed to parse conversion response for {}{}: {}",
                from,
                to,
                e
            )
        })?;

        let conversion = data.response;
        debug!(value = conversion.value, "Conversion received");
        Ok(ConversionQuote {
            from: conversion.from,
            to: conversion.to,
            amount: conversion.amount,
            value: conversion.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "test-key";

    async fn create_mock_server(endpoint: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("api_key", API_KEY))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(server: &MockServer) -> CurrencyBeaconProvider {
        let mut provider = CurrencyBeaconProvider::new(&server.uri(), API_KEY).unwrap();
        provider.retry_delay_ms = 1;
        provider
    }

    #[tokio::test]
    async fn test_fetch_currencies() {
        let body = r#"{
            "meta": {"code": 200},
            "response": [
                {"id": 2, "name": "US Dollar", "short_code": "USD", "code": "840", "symbol": "$"},
                {"id": 1, "name": "Euro", "short_code": "EUR", "code": "978", "symbol": "€"}
            ]
        }"#;
        let server = create_mock_server("/currencies", 200, body).await;

        let currencies = provider(&server).fetch_currencies().await.unwrap();
        assert_eq!(currencies.len(), 2);
        assert_eq!(currencies[0].short_code, "EUR");
        assert_eq!(currencies[0].name, "Euro");
        assert_eq!(currencies[1].id, 2);
    }

    #[tokio::test]
    async fn test_fetch_currencies_http_error() {
        let server = create_mock_server("/currencies", 401, "").await;

        let result = provider(&server).fetch_currencies().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Failed to fetch currencies: 401 Unauthorized"
        );
    }

    #[tokio::test]
    async fn test_convert() {
        let server = MockServer::start().await;
        let body = r#"{
            "meta": {"code": 200},
            "response": {
                "timestamp": 1700000000,
                "date": "2023-11-14",
                "from": "USD",
                "to": "EUR",
                "amount": 100,
                "value": 92.0
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/convert"))
            .and(query_param("api_key", API_KEY))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR"))
            .and(query_param("amount", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let quote = provider(&server).convert("USD", "EUR", 100.0).await.unwrap();
        assert_eq!(quote.from, "USD");
        assert_eq!(quote.to, "EUR");
        assert_eq!(quote.amount, 100.0);
        assert_eq!(quote.value, 92.0);
    }

    #[tokio::test]
    async fn test_convert_http_error() {
        let server = create_mock_server("/convert", 500, "").await;

        let result = provider(&server).convert("USD", "EUR", 100.0).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Conversion failed: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_convert_malformed_response() {
        let server = create_mock_server("/convert", 200, r#"{"response": {"value": "x"}}"#).await;

        let result = provider(&server).convert("USD", "EUR", 100.0).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse conversion response for USDEUR")
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let mut provider = CurrencyBeaconProvider::new("http://127.0.0.1:9", API_KEY).unwrap();
        provider.retry_delay_ms = 1;

        let result = provider.convert("USD", "EUR", 1.0).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Request error for http://127.0.0.1:9/convert")
        );
    }
}
