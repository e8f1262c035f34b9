//! Thin REST client for visit and delivery-evidence submissions.
//!
//! Serializes the frozen snapshots the core hands over and posts them as
//! JSON; evidence bytes travel base64-encoded. Endpoint shape follows the
//! backend's `/visitas` and `/entregas` resources.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use terreno_core::evidence::DeliveryRecord;
use terreno_core::submit::{DeliveryReceipt, SubmissionClient, VisitReceipt};
use terreno_core::visit::VisitSession;

pub struct RestSubmissionClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RestSubmissionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Attaches a bearer token to every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[async_trait]
impl SubmissionClient for RestSubmissionClient {
    async fn submit_visit(&self, visit: &VisitSession) -> Result<VisitReceipt> {
        let response = self
            .request("/visitas")
            .json(visit)
            .send()
            .await
            .context("Visit submission request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "Visit submission rejected: HTTP {}",
            response.status()
        );

        let created: CreatedResponse = response
            .json()
            .await
            .context("Failed to parse visit submission response")?;
        Ok(VisitReceipt {
            visit_id: created.id.to_string(),
        })
    }

    async fn submit_delivery(&self, delivery: &DeliveryRecord) -> Result<DeliveryReceipt> {
        let payload = DeliveryPayload::from(delivery);
        let response = self
            .request("/entregas")
            .json(&payload)
            .send()
            .await
            .context("Delivery submission request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "Delivery submission rejected: HTTP {}",
            response.status()
        );

        let created: CreatedResponse = response
            .json()
            .await
            .context("Failed to parse delivery submission response")?;
        Ok(DeliveryReceipt {
            delivery_id: created.id.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryPayload {
    receiver_name: String,
    company_name: String,
    delivered_at: String,
    photo: EvidencePayload,
    signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvidencePayload {
    file_name: String,
    media_type: String,
    width: u32,
    height: u32,
    bytes: u64,
    data: String,
}

impl From<&DeliveryRecord> for DeliveryPayload {
    fn from(record: &DeliveryRecord) -> Self {
        Self {
            receiver_name: record.receiver_name.clone(),
            company_name: record.company_name.clone(),
            delivered_at: record.delivered_at.to_rfc3339(),
            photo: EvidencePayload {
                file_name: record.photo_meta.name.clone(),
                media_type: record.photo.media_type.clone(),
                width: record.photo.width,
                height: record.photo.height,
                bytes: record.photo.bytes.len() as u64,
                data: BASE64.encode(&record.photo.bytes),
            },
            signature: BASE64.encode(&record.signature),
        }
    }
}
