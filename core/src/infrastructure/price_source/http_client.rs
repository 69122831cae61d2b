use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{
    common::{PriceSourceConfig, entities::app_errors::CoreError},
    ingredient::entities::{Ingredient, PriceSource},
    price_update::{entities::ObservedPrice, ports::PriceSourceClient},
    unit::value_objects::Unit,
};

/// Market price feed reached over HTTP.
///
/// `GET {endpoint}/prices/latest?ingredient=<name>&unit=<unit>` answering with a
/// [`QuoteResponse`] body.
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    price: Decimal,
    unit: String,
    observed_at: Option<DateTime<Utc>>,
    market: Option<String>,
}

impl HttpPriceSource {
    pub fn new(config: &PriceSourceConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build price source client: {}", e);
                CoreError::InternalServerError
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn quote_url(&self, ingredient: &Ingredient) -> String {
        format!(
            "{}/prices/latest?ingredient={}&unit={}",
            self.endpoint,
            urlencoding::encode(&ingredient.name),
            ingredient.unit
        )
    }
}

impl PriceSourceClient for HttpPriceSource {
    async fn fetch_latest_price(&self, ingredient: Ingredient) -> Result<ObservedPrice, CoreError> {
        let mut request = self.client.get(self.quote_url(&ingredient));
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Price source request failed: {}", e);
            if e.is_timeout() {
                CoreError::SourceTimeout
            } else {
                CoreError::SourceFetch(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Price source error: {} - {}", status, error_text);
            return Err(CoreError::SourceFetch(format!(
                "price source returned {status}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read price source response: {}", e);
            CoreError::SourceFetch(e.to_string())
        })?;

        let quote: QuoteResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse price source response: {} - {}", e, body);
            CoreError::SourceFetch(format!("malformed quote: {e}"))
        })?;

        quote.into_observed()
    }
}

impl QuoteResponse {
    fn into_observed(self) -> Result<ObservedPrice, CoreError> {
        let unit: Unit = self
            .unit
            .parse()
            .map_err(|_| CoreError::SourceFetch(format!("unknown unit {:?}", self.unit)))?;

        Ok(ObservedPrice {
            price: self.price,
            unit,
            source: PriceSource::Api,
            observed_at: self.observed_at,
            market_name: self.market,
        })
    }
}
