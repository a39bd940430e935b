//! HTTP classifier gateway
//!
//! Posts `{"text": ...}` to a model endpoint and reads the label from the
//! JSON reply. Any transport error, non-success status, or unrecognized body
//! makes the classification unavailable, which intake absorbs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use ticketing::router::{ClassificationUnavailable, Classifier};
use ticketing::state::CategoryLabel;

/// Response keys that may carry the label, in lookup order
const LABEL_KEYS: [&str; 3] = ["label", "category", "prediction"];

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

/// Classifier backed by a remote model endpoint
#[derive(Clone)]
pub struct HttpClassifier {
    http: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    /// A zero `timeout` leaves requests unbounded.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<CategoryLabel, ClassificationUnavailable> {
        let response = self
            .http
            .post(&self.url)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| ClassificationUnavailable::new(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationUnavailable::new(format!(
                "classifier error ({}): {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClassificationUnavailable::new(format!("Failed to parse response: {}", e)))?;

        let label = parse_label(&body)
            .ok_or_else(|| ClassificationUnavailable::new(format!("no label in response: {}", body)))?;
        debug!(label = %label, "Classifier answered");
        Ok(label)
    }
}

/// Extract the label from a classifier reply.
///
/// Accepts a bare string, a one-element list (as model servers often return
/// batched predictions), or an object with a `label`, `category`, or
/// `prediction` field holding either of those.
pub fn parse_label(body: &Value) -> Option<CategoryLabel> {
    match body {
        Value::String(label) => Some(label.clone()),
        Value::Array(items) => items.first().and_then(parse_label),
        Value::Object(fields) => LABEL_KEYS
            .iter()
            .find_map(|key| fields.get(*key))
            .filter(|v| !v.is_object())
            .and_then(parse_label),
        _ => None,
    }
}
