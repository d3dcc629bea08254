use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Boundary to the inventory service that owns reserved quantities.
///
/// Invoked after an invoice is generated. Callers treat failures as
/// non-fatal: the status change is already committed and is not rolled back
/// when the decrement fails (the gap is logged, not compensated).
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn decrement_reserved(&self, product_id: Uuid, quantity: i32)
        -> Result<(), ServiceError>;
}

#[derive(Debug, Serialize)]
struct DecrementRequest {
    product_id: Uuid,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct DecrementResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the inventory service.
#[derive(Clone)]
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    async fn decrement_reserved(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let url = format!("{}/inventory/decrement-reserved", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&DecrementRequest {
                product_id,
                quantity,
            })
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "inventory service returned {}",
                response.status()
            )));
        }

        let body: DecrementResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        if !body.success {
            return Err(ServiceError::ExternalServiceError(
                body.message
                    .unwrap_or_else(|| "inventory decrement rejected".into()),
            ));
        }

        debug!("Reserved quantity decremented");
        Ok(())
    }
}

/// No-op client for deployments without an inventory service and for tests.
#[derive(Debug, Clone, Default)]
pub struct NoopInventoryClient;

#[async_trait]
impl InventoryClient for NoopInventoryClient {
    async fn decrement_reserved(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        debug!(%product_id, quantity, "Inventory client disabled; decrement skipped");
        Ok(())
    }
}
