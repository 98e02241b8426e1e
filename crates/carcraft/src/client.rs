//! HTTP client for the price prediction API
//!
//! The model itself runs behind `POST /api/predict`; this module only sends
//! the car attributes and decodes the answer.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::record::{CarAttributes, PredictionDetails, PriceRange};

/// Body returned by the prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
  pub prediction: f64,
  pub confidence_score: f64,
  #[serde(default)]
  pub model_used: Option<String>,
  #[serde(default)]
  pub model_performance: Option<serde_json::Value>,
  #[serde(default)]
  pub features_used: Option<Vec<String>>,
  #[serde(default)]
  pub car_info: Option<serde_json::Value>,
}

impl PredictionResponse {
  /// Metadata to keep with a prediction stored at `price`
  pub fn details(&self, price: f64) -> PredictionDetails {
    PredictionDetails {
      model_used: self.model_used.clone(),
      model_performance: self.model_performance.clone(),
      features_used: self.features_used.clone(),
      price_range: Some(PriceRange::around(price)),
    }
  }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait PredictionApi {
  async fn predict(&self, attributes: &CarAttributes) -> Result<PredictionResponse>;
}

pub struct HttpPredictionApi {
  client: Client,
  base_url: String,
}

impl HttpPredictionApi {
  pub fn new(config: &Config) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {e}"))?;

    Ok(Self { client, base_url: config.api_base_url.trim_end_matches('/').to_string() })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }
}

impl PredictionApi for HttpPredictionApi {
  async fn predict(&self, attributes: &CarAttributes) -> Result<PredictionResponse> {
    let url = format!("{}/api/predict", self.base_url);
    debug!(%url, car = %attributes.display_name(), "requesting prediction");

    let response = self.client.post(&url).json(attributes).send().await?;
    let status = response.status();

    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<ErrorBody>(&text).map(|b| b.error).unwrap_or(text);
      return Err(anyhow!("Prediction request failed ({status}): {message}"));
    }

    let body: PredictionResponse = response.json().await?;
    if !body.prediction.is_finite() {
      return Err(anyhow!("Prediction API returned a non-numeric price"));
    }
    Ok(body)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_response_decodes_with_optional_fields_missing() {
    let body = r#"{"prediction": 512345.6, "confidence_score": 91}"#;
    let parsed: PredictionResponse = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.prediction, 512345.6);
    assert_eq!(parsed.confidence_score, 91.0);
    assert_eq!(parsed.model_used, None);
  }

  #[test]
  fn test_details_carry_model_metadata() {
    let body = r#"{
      "prediction": 1.0,
      "confidence_score": 80,
      "model_used": "random_forest",
      "features_used": ["year", "kms_driven"],
      "model_performance": {"r2": 0.91}
    }"#;
    let parsed: PredictionResponse = serde_json::from_str(body).unwrap();
    let details = parsed.details(200_000.0);
    assert_eq!(details.model_used.as_deref(), Some("random_forest"));
    assert_eq!(details.price_range, Some(PriceRange { min: 180_000.0, max: 220_000.0 }));
    assert_eq!(details.features_used.unwrap().len(), 2);
    assert_eq!(details.model_performance.unwrap()["r2"], 0.91);
  }

  #[test]
  fn test_base_url_trailing_slash_trimmed() {
    let config = Config { api_base_url: "http://api.local:5000/".to_string(), ..Config::default() };
    let api = HttpPredictionApi::new(&config).unwrap();
    assert_eq!(api.base_url(), "http://api.local:5000");
  }
}
