use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Succeeded,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub booking_reference: String,
    pub amount: f64,
    pub payment_method: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt to charge for a booking. Each call is an independent attempt.
    async fn charge(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentOutcome, Box<dyn std::error::Error + Send + Sync>>;
}
