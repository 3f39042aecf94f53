//! Gateway configuration from environment.

use std::env;
use std::sync::Arc;

use crate::factory::GatewayFactory;
use crate::paypal::PayPalGateway;
use crate::stripe::StripeGateway;

/// Provider credentials, all optional: only configured providers register.
pub struct GatewaysConfig {
    pub stripe_secret_key: Option<String>,
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
}

impl GatewaysConfig {
    /// Loads provider credentials from environment variables.
    pub fn from_env() -> Self {
        Self {
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok(),
            paypal_client_id: env::var("PAYPAL_CLIENT_ID").ok(),
            paypal_client_secret: env::var("PAYPAL_CLIENT_SECRET").ok(),
        }
    }

    /// Builds the registration table from the configured providers.
    pub fn build_factory(&self) -> GatewayFactory {
        let mut factory = GatewayFactory::new();

        if let Some(key) = &self.stripe_secret_key {
            factory.register("Stripe", Arc::new(StripeGateway::new(key.clone())));
        }

        if let (Some(id), Some(secret)) = (&self.paypal_client_id, &self.paypal_client_secret) {
            factory.register(
                "PayPal",
                Arc::new(PayPalGateway::new(id.clone(), secret.clone())),
            );
        }

        factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_providers_do_not_register() {
        let config = GatewaysConfig {
            stripe_secret_key: Some("sk_test_123".into()),
            paypal_client_id: None,
            paypal_client_secret: None,
        };

        let factory = config.build_factory();
        assert!(factory.get("Stripe").is_ok());
        assert!(factory.get("PayPal").is_err());
    }
}
