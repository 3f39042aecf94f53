//! Scripted gateway for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use ledger_types::{
    GatewayError, Money, OwnerId, PaymentGateway, PaymentResult, TokenizedCard,
};

/// What every call to the mock should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Capture settles, create returns a pending approval flow.
    Succeed,
    /// Provider verdict: declined. Normalized to a Failed result.
    Decline,
    /// No provider verdict at all.
    Timeout,
}

/// In-process gateway with scripted behavior and call counters.
pub struct MockGateway {
    behavior: MockBehavior,
    captures: AtomicUsize,
    creates: AtomicUsize,
}

impl MockGateway {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            captures: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }

    /// Number of capture calls that reached the provider.
    pub fn capture_calls(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Number of create calls that reached the provider.
    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment(
        &self,
        _amount: Money,
        _return_url: &str,
        _cancel_url: &str,
    ) -> Result<PaymentResult, GatewayError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Succeed => Ok(PaymentResult::pending(
                format!("mock_pay_{}", uuid::Uuid::new_v4()),
                Some("https://example.com/approve".to_string()),
            )),
            MockBehavior::Decline => Ok(PaymentResult::failed()),
            MockBehavior::Timeout => Err(GatewayError::Transport("mock timeout".into())),
        }
    }

    async fn capture_payment(
        &self,
        _payment_id: &str,
        _customer_ref: &str,
        _amount: Money,
        _description: &str,
    ) -> Result<PaymentResult, GatewayError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Succeed => Ok(PaymentResult::completed(format!(
                "mock_charge_{}",
                uuid::Uuid::new_v4()
            ))),
            MockBehavior::Decline => Ok(PaymentResult::failed()),
            MockBehavior::Timeout => Err(GatewayError::Transport("mock timeout".into())),
        }
    }
}

#[async_trait::async_trait]
impl ledger_types::CardTokenizer for MockGateway {
    async fn exchange_token(
        &self,
        _owner: OwnerId,
        one_time_token: &str,
    ) -> Result<TokenizedCard, GatewayError> {
        if one_time_token.is_empty() || self.behavior == MockBehavior::Decline {
            return Err(GatewayError::InvalidToken("mock rejected token".into()));
        }
        Ok(TokenizedCard {
            provider_token: format!("card_{}", uuid::Uuid::new_v4()),
            customer_ref: format!("cus_{}", uuid::Uuid::new_v4()),
            last4: "4242".into(),
            brand: "Visa".into(),
            exp_month: 12,
            exp_year: 2030,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::Currency;

    #[tokio::test]
    async fn test_decline_is_a_result_not_an_error() {
        let gateway = MockGateway::new(MockBehavior::Decline);
        let result = gateway
            .capture_payment("pay_1", "cus_1", Money::new(100, Currency::USD).unwrap(), "")
            .await
            .unwrap();
        assert!(!result.is_completed());
        assert!(result.payment_id.is_none());
        assert_eq!(gateway.capture_calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_fault() {
        let gateway = MockGateway::new(MockBehavior::Timeout);
        let result = gateway
            .capture_payment("pay_1", "cus_1", Money::new(100, Currency::USD).unwrap(), "")
            .await;
        assert!(matches!(result, Err(GatewayError::Transport(_))));
    }
}
