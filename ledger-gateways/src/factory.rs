//! Gateway registration table.

use std::collections::HashMap;
use std::sync::Arc;

use ledger_types::{GatewayError, PaymentGateway};

/// Resolves a provider key to a concrete gateway adapter.
///
/// Providers register by key at initialization; after that the table is
/// read-only and safe for concurrent lookups. This is the only place
/// provider selection logic lives - adding a provider means registering it
/// here, never touching the service.
#[derive(Default)]
pub struct GatewayFactory {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
}

impl GatewayFactory {
    pub fn new() -> Self {
        Self {
            gateways: HashMap::new(),
        }
    }

    /// Registers a gateway under the given key, replacing any previous
    /// registration for that key.
    pub fn register(&mut self, key: impl Into<String>, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(key.into(), gateway);
    }

    /// Resolves a gateway by key. Pure lookup, no side effects.
    pub fn get(&self, key: &str) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.gateways
            .get(key)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownGateway(key.to_string()))
    }

    /// Registered provider keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.gateways.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBehavior, MockGateway};

    #[test]
    fn test_lookup_registered_gateway() {
        let mut factory = GatewayFactory::new();
        factory.register("Stripe", Arc::new(MockGateway::new(MockBehavior::Succeed)));

        let gateway = factory.get("Stripe").unwrap();
        assert_eq!(gateway.name(), "mock");
    }

    #[test]
    fn test_unknown_gateway_key() {
        let factory = GatewayFactory::new();
        let result = factory.get("DoesNotExist");
        assert!(matches!(result, Err(GatewayError::UnknownGateway(key)) if key == "DoesNotExist"));
    }
}
