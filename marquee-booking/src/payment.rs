use async_trait::async_trait;
use rand::Rng;
use tracing::debug;
use marquee_core::payment::{PaymentGateway, PaymentOutcome, PaymentRequest};

/// Stand-in for a real processor: each attempt succeeds independently with a
/// fixed probability. No state carries over between attempts.
pub struct SimulatedPaymentGateway {
    success_rate: f64,
}

impl SimulatedPaymentGateway {
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        debug!(booking_reference = %request.booking_reference, amount = request.amount, approved, "Simulated payment attempt");

        Ok(if approved {
            PaymentOutcome::Succeeded
        } else {
            PaymentOutcome::Declined
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            booking_reference: "BK1".to_string(),
            amount: 10.0,
            payment_method: "card".to_string(),
        }
    }

    #[tokio::test]
    async fn test_extreme_rates_are_deterministic() {
        let always = SimulatedPaymentGateway::new(1.0);
        let never = SimulatedPaymentGateway::new(0.0);

        for _ in 0..20 {
            assert_eq!(always.charge(&request()).await.unwrap(), PaymentOutcome::Succeeded);
            assert_eq!(never.charge(&request()).await.unwrap(), PaymentOutcome::Declined);
        }
    }

    #[tokio::test]
    async fn test_default_rate_mostly_succeeds() {
        let gateway = SimulatedPaymentGateway::default();
        let mut successes = 0;
        for _ in 0..2000 {
            if gateway.charge(&request()).await.unwrap() == PaymentOutcome::Succeeded {
                successes += 1;
            }
        }
        // 90% expected; bounds are many standard deviations wide
        assert!((1650..=1950).contains(&successes), "successes = {}", successes);
    }

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(SimulatedPaymentGateway::new(1.7).success_rate, 1.0);
        assert_eq!(SimulatedPaymentGateway::new(-0.2).success_rate, 0.0);
    }
}
